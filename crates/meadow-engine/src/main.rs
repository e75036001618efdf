//! # Meadow
//!
//! Text front end for the meadow farming simulation.
//!
//! Walk the field, plant and water seeds, harvest crops, pick up forage and
//! ship goods for money. Commands are read from stdin, or from a
//! `;`-separated `--script`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod command;
mod config;

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;

/// Parsed command-line arguments.
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    script: Option<String>,
    write_config: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config requires a path")?;
                parsed.config = Some(PathBuf::from(path));
            },
            "--script" | "-s" => {
                parsed.script = Some(args.next().context("--script requires commands")?);
            },
            "--write-config" => {
                let path = args.next().context("--write-config requires a path")?;
                parsed.write_config = Some(PathBuf::from(path));
            },
            "--help" | "-h" => {
                println!(
                    "usage: meadow [--config <file>] [--script \"cmd; cmd; ...\"] [--write-config <file>]"
                );
                std::process::exit(0);
            },
            other => bail!("Unknown argument: {other}"),
        }
    }
    Ok(parsed)
}

/// Main entry point.
fn main() -> Result<()> {
    // Logs go to stderr so they never mix with game output
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("meadow=info".parse()?))
        .init();

    info!("Meadow starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = parse_args(std::env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };
    if let Some(path) = &args.write_config {
        config
            .save_to(path)
            .with_context(|| format!("writing config to {}", path.display()))?;
        return Ok(());
    }

    let script = args
        .script
        .as_deref()
        .map(command::parse_script)
        .transpose()
        .map_err(anyhow::Error::msg)
        .context("invalid --script")?;

    app::run(config, script)?;

    info!("Meadow shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(ToString::to_string))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["--config", "farm.toml", "-s", "water; ship"]).expect("args");
        assert_eq!(parsed.config, Some(PathBuf::from("farm.toml")));
        assert_eq!(parsed.script.as_deref(), Some("water; ship"));

        assert!(args(&[]).expect("args").script.is_none());
        let parsed = args(&["--write-config", "out.toml"]).expect("args");
        assert_eq!(parsed.write_config, Some(PathBuf::from("out.toml")));
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--fly"]).is_err());
    }
}
