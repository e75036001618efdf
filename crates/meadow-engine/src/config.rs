//! Engine configuration.
//!
//! Front-end settings (where saves live, where the shop and shipping bin
//! stand, which seeds unlock when) plus the embedded simulation settings.
//! Loaded from `meadow.toml`; a missing or malformed file yields defaults.

use meadow_common::{KindId, Position};
use meadow_gameplay::SimulationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "meadow.toml";

/// Directory name used under the platform config and data directories.
const APP_DIR: &str = "meadow";

/// A plant whose seeds go on sale from a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRule {
    /// First day the seeds are sold
    pub day: u32,
    /// Plant kind unlocked
    pub plant: KindId,
}

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding save files
    pub save_dir: PathBuf,
    /// Save slot used by `save` and `load`
    pub save_name: String,
    /// Plant/forage registry file (None = built-in registries)
    pub catalog_path: Option<PathBuf>,
    /// Save automatically on `quit`
    pub auto_save_on_quit: bool,
    /// Seeds sold from the start
    pub starting_plants: Vec<KindId>,
    /// Tile where seeds can be bought
    pub shop_tile: Position,
    /// Tile where goods can be shipped
    pub shipping_tile: Position,
    /// Seeds that go on sale later
    pub unlocks: Vec<UnlockRule>,
    /// Simulation settings
    pub simulation: SimulationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            save_name: "farm".to_string(),
            catalog_path: None,
            auto_save_on_quit: false,
            starting_plants: vec![
                KindId::new("carrot"),
                KindId::new("tomato"),
                KindId::new("melon"),
            ],
            shop_tile: Position::new(16, 2),
            shipping_tile: Position::new(16, 4),
            unlocks: vec![UnlockRule {
                day: 3,
                plant: KindId::new("gigantic_pumpkin"),
            }],
            simulation: SimulationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Default configuration file path.
    ///
    /// A `meadow.toml` in the working directory wins over the platform
    /// config directory.
    pub fn config_path() -> PathBuf {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .unwrap_or(local)
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.simulation.validate();

        let width = self.simulation.field_width as i32;
        let height = self.simulation.field_height as i32;
        for tile in [&mut self.shop_tile, &mut self.shipping_tile] {
            *tile = Position::new(tile.x.clamp(0, width - 1), tile.y.clamp(0, height - 1));
        }

        let name = self.save_name.trim();
        self.save_name = if name.is_empty() || name.contains(['/', '\\']) {
            "farm".to_string()
        } else {
            name.to_string()
        };

        for rule in &mut self.unlocks {
            rule.day = rule.day.max(1);
        }
        self.starting_plants.dedup();
    }

    /// Plants on sale on `day`, in a stable order.
    #[must_use]
    pub fn plants_for_sale(&self, day: u32) -> Vec<KindId> {
        let mut plants = self.starting_plants.clone();
        for rule in &self.unlocks {
            if day >= rule.day && !plants.contains(&rule.plant) {
                plants.push(rule.plant.clone());
            }
        }
        plants
    }
}

/// Platform data directory for saves, or `./saves`.
fn default_save_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join("saves"))
        .unwrap_or_else(|| PathBuf::from("saves"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.shop_tile, Position::new(16, 2));
        assert_eq!(config.shipping_tile, Position::new(16, 4));
        assert_eq!(config.save_name, "farm");
        assert_eq!(config.simulation.field_width, 18);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig {
            shop_tile: Position::new(100, -4),
            save_name: "../escape".to_string(),
            ..EngineConfig::default()
        };
        config.simulation.field_width = 5;
        config.validate();

        assert_eq!(config.shop_tile, Position::new(4, 0));
        assert_eq!(config.shipping_tile.x, 4);
        assert_eq!(config.save_name, "farm");
    }

    #[test]
    fn test_plants_for_sale() {
        let config = EngineConfig::default();
        let names = |day| {
            config
                .plants_for_sale(day)
                .iter()
                .map(|k| k.as_str().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(1), vec!["carrot", "tomato", "melon"]);
        assert_eq!(names(2).len(), 3);
        assert_eq!(names(3).last().map(String::as_str), Some("gigantic_pumpkin"));
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = EngineConfig {
            save_name: "slot2".to_string(),
            catalog_path: Some(PathBuf::from("plants.toml")),
            ..EngineConfig::default()
        };
        config.simulation.rng_seed = Some(5);
        config.save_to(&path).expect("save");

        let loaded = EngineConfig::load_from(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_or_broken_file() {
        let dir = tempdir().expect("tempdir");
        let missing = EngineConfig::load_from(dir.path().join("nope.toml"));
        assert_eq!(missing, EngineConfig::default());

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "save_name = [").expect("write");
        assert_eq!(EngineConfig::load_from(&broken), EngineConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            save_name = "spring"

            [simulation]
            starting_money = 500
            "#,
        )
        .expect("parse");
        assert_eq!(config.save_name, "spring");
        assert_eq!(config.simulation.starting_money, 500);
        assert_eq!(config.simulation.day_length, 900);
        assert_eq!(config.shop_tile, Position::new(16, 2));
    }
}
