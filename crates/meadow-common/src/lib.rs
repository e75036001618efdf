//! # Meadow Common
//!
//! Common types shared by the meadow farming simulation crates.
//!
//! This crate provides foundational types used across all meadow subsystems:
//! - Grid coordinates and movement directions
//! - Kind and item identifiers
//! - Version information for save schemas
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_step() {
        let pos = Position::new(3, 4);
        assert_eq!(pos.step(Direction::Up), Position::new(3, 3));
        assert_eq!(pos.step(Direction::Down), Position::new(3, 5));
        assert_eq!(pos.step(Direction::Left), Position::new(2, 4));
        assert_eq!(pos.step(Direction::Right), Position::new(4, 4));
        assert_eq!(Position::new(0, 0).step(Direction::Left), Position::new(-1, 0));
    }

    #[test]
    fn test_position_index_conversion() {
        assert_eq!(Position::new(2, 1).to_index(4, 3), Some(6));
        assert_eq!(Position::from_index(6, 4), Position::new(2, 1));
        assert_eq!(Position::new(4, 0).to_index(4, 3), None);
        assert_eq!(Position::new(0, 3).to_index(4, 3), None);
        assert_eq!(Position::new(-1, 0).to_index(4, 3), None);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("UP"), Some(Direction::Up));
        assert_eq!(Direction::parse("w"), Some(Direction::Left));
        assert_eq!(Direction::parse("sideways"), None);
    }

    #[test]
    fn test_item_id_string_form() {
        let seeds = ItemId::seeds_for("carrot");
        assert_eq!(seeds.to_string(), "carrot_seeds");
        assert!(seeds.is_seed());
        assert_eq!(seeds.seed_of(), Some(&KindId::new("carrot")));

        let parsed: ItemId = "gigantic_pumpkin_seeds".parse().unwrap_or_else(|e| match e {});
        assert_eq!(parsed, ItemId::seeds_for("gigantic_pumpkin"));

        let produce = ItemId::from("mushrooms");
        assert!(!produce.is_seed());
        assert_eq!(produce.kind().as_str(), "mushrooms");

        // A bare suffix is not a seed of an empty kind.
        assert_eq!(ItemId::from("_seeds"), ItemId::produce("_seeds"));
    }

    #[test]
    fn test_item_id_serde_uses_string_form() {
        let json = serde_json::to_string(&ItemId::seeds_for("tomato")).expect("serialize");
        assert_eq!(json, "\"tomato_seeds\"");
        let back: ItemId = serde_json::from_str("\"herbs\"").expect("deserialize");
        assert_eq!(back, ItemId::produce("herbs"));
    }

    #[test]
    fn test_version_compatibility() {
        let current = SchemaVersion::SAVE_SNAPSHOT;
        assert!(current.can_read(&SchemaVersion::new(1, 4, 2)));
        assert!(!current.can_read(&SchemaVersion::new(2, 0, 0)));
        assert_eq!(current.to_string(), "v1.0.0");
    }

    #[test]
    fn test_magic_bytes() {
        assert!(MagicBytes::SAVE.matches(b"MDSV\x00\x01"));
        assert!(!MagicBytes::SAVE.matches(b"MDS"));
        assert!(!MagicBytes::SAVE.matches(b"GNSV...."));
    }
}
