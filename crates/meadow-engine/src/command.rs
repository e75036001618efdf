//! Text commands for driving the farm.
//!
//! One command per line, e.g. `move up`, `buy carrot 3`, `wait 60`. A script
//! passed on the command line separates commands with `;`.

use meadow_common::{Direction, ItemId, KindId};

/// A single player command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Step one cell
    Move(Direction),
    /// Select an inventory item
    Select(ItemId),
    /// Select the next seed item
    Cycle,
    /// Plant the given kind, or the selected seeds
    Plant(Option<KindId>),
    /// Water the crop underfoot
    Water,
    /// Harvest the crop underfoot
    Harvest,
    /// Pick up forage underfoot
    Forage,
    /// Buy seeds at the shop
    Buy {
        /// Kind to buy (None = selected or first on sale)
        kind: Option<KindId>,
        /// How many
        quantity: u32,
    },
    /// Ship goods at the shipping bin
    Ship,
    /// Let real time pass
    Wait {
        /// Real seconds
        seconds: f64,
    },
    /// Print the player and the cell underfoot
    Status,
    /// Draw the field
    Map,
    /// Save to the configured slot
    Save,
    /// Load the configured slot
    Load,
    /// List commands
    Help,
    /// Leave
    Quit,
}

/// Longest single `wait`, in real seconds (twelve default-length days).
pub const MAX_WAIT_SECONDS: f64 = 10_800.0;

/// Usage lines shown by `help`.
pub const HELP: &[&str] = &[
    "move <up|down|left|right>   step one cell (u/d/l/r and n/s/e/w also work)",
    "select <item>               select an item, e.g. `select carrot_seeds`",
    "cycle                       select the next seed in your inventory",
    "plant [kind]                plant here (defaults to the selected seeds)",
    "water                       water the crop here",
    "harvest                     harvest the ripe crop here",
    "forage                      pick up the forage item here",
    "buy [kind] [qty]            buy seeds (stand on the shop tile)",
    "ship                        ship goods (stand on the shipping bin)",
    "wait <seconds>              let time pass (up to 10800)",
    "status | map                show the farm",
    "save | load                 save or load the game",
    "help | quit",
];

/// Parse a single command.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = parts.first() else {
        return Err("Empty command".to_string());
    };

    match first.to_lowercase().as_str() {
        "move" | "go" => {
            let name = parts.get(1).ok_or("move requires a direction")?;
            Direction::parse(name)
                .map(Command::Move)
                .ok_or_else(|| format!("Unknown direction: {name}"))
        },
        "up" | "down" | "left" | "right" => Direction::parse(first)
            .map(Command::Move)
            .ok_or_else(|| format!("Unknown direction: {first}")),
        "select" => {
            let item = parts.get(1).ok_or("select requires an item")?;
            Ok(Command::Select(ItemId::from(item.to_string())))
        },
        "cycle" | "next" => Ok(Command::Cycle),
        "plant" => Ok(Command::Plant(parts.get(1).map(|k| KindId::new(*k)))),
        "water" => Ok(Command::Water),
        "harvest" => Ok(Command::Harvest),
        "forage" | "pick" => Ok(Command::Forage),
        "buy" => {
            let (kind, quantity) = match &parts[1..] {
                [] => (None, 1),
                [arg] => match arg.parse::<u32>() {
                    Ok(quantity) => (None, quantity),
                    Err(_) => (Some(KindId::new(*arg)), 1),
                },
                [kind, qty, ..] => {
                    let quantity = qty
                        .parse::<u32>()
                        .map_err(|e| format!("Invalid quantity: {e}"))?;
                    (Some(KindId::new(*kind)), quantity)
                },
            };
            Ok(Command::Buy { kind, quantity })
        },
        "ship" => Ok(Command::Ship),
        "wait" | "sleep" => {
            let seconds = parts
                .get(1)
                .ok_or("wait requires seconds")?
                .parse::<f64>()
                .map_err(|e| format!("Invalid duration: {e}"))?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(format!("Invalid duration: {seconds}"));
            }
            if seconds > MAX_WAIT_SECONDS {
                return Err(format!(
                    "Invalid duration: {seconds} (at most {MAX_WAIT_SECONDS} seconds)"
                ));
            }
            Ok(Command::Wait { seconds })
        },
        "status" | "inv" => Ok(Command::Status),
        "map" => Ok(Command::Map),
        "save" => Ok(Command::Save),
        "load" => Ok(Command::Load),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        _ => Err(format!("Unknown command: {first}")),
    }
}

/// Parse a `;`-separated script.
pub fn parse_script(script: &str) -> Result<Vec<Command>, String> {
    script
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_command)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_movement() {
        assert_eq!(parse_command("move up"), Ok(Command::Move(Direction::Up)));
        assert_eq!(parse_command("MOVE l"), Ok(Command::Move(Direction::Left)));
        assert_eq!(parse_command("right"), Ok(Command::Move(Direction::Right)));
        assert!(parse_command("move").is_err());
        assert!(parse_command("move sideways").is_err());
    }

    #[test]
    fn test_parse_buy_forms() {
        assert_eq!(
            parse_command("buy"),
            Ok(Command::Buy {
                kind: None,
                quantity: 1
            })
        );
        assert_eq!(
            parse_command("buy 4"),
            Ok(Command::Buy {
                kind: None,
                quantity: 4
            })
        );
        assert_eq!(
            parse_command("buy melon"),
            Ok(Command::Buy {
                kind: Some(KindId::new("melon")),
                quantity: 1
            })
        );
        assert_eq!(
            parse_command("buy tomato 2"),
            Ok(Command::Buy {
                kind: Some(KindId::new("tomato")),
                quantity: 2
            })
        );
        assert!(parse_command("buy tomato lots").is_err());
    }

    #[test]
    fn test_parse_select_and_plant() {
        assert_eq!(
            parse_command("select carrot_seeds"),
            Ok(Command::Select(ItemId::seeds_for("carrot")))
        );
        assert_eq!(parse_command("plant"), Ok(Command::Plant(None)));
        assert_eq!(
            parse_command("plant tomato"),
            Ok(Command::Plant(Some(KindId::new("tomato"))))
        );
    }

    #[test]
    fn test_parse_wait() {
        assert_eq!(parse_command("wait 2.5"), Ok(Command::Wait { seconds: 2.5 }));
        assert!(parse_command("wait").is_err());
        assert!(parse_command("wait -3").is_err());
        assert!(parse_command("wait soon").is_err());
        assert_eq!(
            parse_command("wait 10800"),
            Ok(Command::Wait {
                seconds: MAX_WAIT_SECONDS
            })
        );
        assert!(parse_command("wait 10800.5").is_err());
        assert!(parse_command("wait 1e12").is_err());
    }

    #[test]
    fn test_parse_script() {
        let commands = parse_script("move down; plant carrot;; water ; wait 40").expect("parse");
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[3], Command::Wait { seconds: 40.0 });
        assert!(parse_script("water; dance").is_err());
        assert!(parse_command("   ").is_err());
    }
}
