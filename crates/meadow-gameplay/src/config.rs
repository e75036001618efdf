//! Simulation settings.

use meadow_common::{ItemId, KindId, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::inventory::Inventory;
use crate::time::{DEFAULT_DAY_LENGTH, DEFAULT_MINUTES_PER_SECOND};

/// Largest accepted field side, in cells.
const MAX_FIELD_SIDE: u32 = 256;
/// Largest accepted day length, in minutes.
const MAX_DAY_LENGTH: u32 = 24 * 60 * 7;

/// Settings fixed for the lifetime of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Field width in cells
    pub field_width: u32,
    /// Field height in cells
    pub field_height: u32,
    /// Length of a day in game minutes
    pub day_length: u32,
    /// Game minutes per real second
    pub minutes_per_second: f64,
    /// Money at the start of a new game
    pub starting_money: u64,
    /// Plant whose ripening wins the game
    pub ultimate_plant: KindId,
    /// Forage RNG seed (None = random)
    pub rng_seed: Option<u64>,
    /// Where the player starts
    pub start_position: Position,
    /// Items at the start of a new game
    pub starting_inventory: BTreeMap<ItemId, u32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            field_width: 18,
            field_height: 16,
            day_length: DEFAULT_DAY_LENGTH,
            minutes_per_second: DEFAULT_MINUTES_PER_SECOND,
            starting_money: 20,
            ultimate_plant: KindId::new("gigantic_pumpkin"),
            rng_seed: None,
            start_position: Position::new(9, 7),
            starting_inventory: BTreeMap::from([
                (ItemId::seeds_for("carrot"), 3),
                (ItemId::seeds_for("tomato"), 2),
            ]),
        }
    }
}

impl SimulationConfig {
    /// Clamp every value into a usable range.
    pub fn validate(&mut self) {
        self.field_width = self.field_width.clamp(1, MAX_FIELD_SIDE);
        self.field_height = self.field_height.clamp(1, MAX_FIELD_SIDE);
        self.day_length = self.day_length.clamp(1, MAX_DAY_LENGTH);
        if !self.minutes_per_second.is_finite() || self.minutes_per_second <= 0.0 {
            self.minutes_per_second = DEFAULT_MINUTES_PER_SECOND;
        }
        self.minutes_per_second = self.minutes_per_second.min(f64::from(self.day_length));
        self.start_position = Position::new(
            self.start_position.x.clamp(0, self.field_width as i32 - 1),
            self.start_position.y.clamp(0, self.field_height as i32 - 1),
        );
        self.starting_inventory.retain(|_, count| *count > 0);
    }

    /// The starting inventory.
    #[must_use]
    pub fn starting_inventory(&self) -> Inventory {
        Inventory::from(self.starting_inventory.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.field_width, 18);
        assert_eq!(config.field_height, 16);
        assert_eq!(config.day_length, 900);
        assert_eq!(config.starting_money, 20);
        assert_eq!(config.start_position, Position::new(9, 7));
        assert_eq!(
            config.starting_inventory().count(&ItemId::seeds_for("carrot")),
            3
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimulationConfig {
            field_width: 0,
            field_height: 10_000,
            day_length: 0,
            minutes_per_second: -2.0,
            start_position: Position::new(40, -3),
            ..SimulationConfig::default()
        };
        config.starting_inventory.insert(ItemId::produce("herbs"), 0);
        config.validate();

        assert_eq!(config.field_width, 1);
        assert_eq!(config.field_height, MAX_FIELD_SIDE);
        assert_eq!(config.day_length, 1);
        assert!((config.minutes_per_second - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.start_position, Position::new(0, 0));
        assert!(!config.starting_inventory.contains_key(&ItemId::produce("herbs")));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
            field_width = 10
            rng_seed = 99

            [starting_inventory]
            melon_seeds = 1
            "#,
        )
        .expect("parse");
        assert_eq!(config.field_width, 10);
        assert_eq!(config.field_height, 16);
        assert_eq!(config.rng_seed, Some(99));
        assert_eq!(config.starting_inventory().len(), 1);
        assert_eq!(config.ultimate_plant.as_str(), "gigantic_pumpkin");
    }
}
