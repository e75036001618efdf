//! # Meadow Gameplay
//!
//! The farming simulation engine.
//!
//! This crate provides everything that decides what the farm looks like at
//! any moment:
//! - Plant and forage registries (catalog)
//! - The field grid and its cells
//! - Plant growth and forage spawning
//! - Player, wallet and inventory
//! - Player actions (plant, water, harvest, forage, buy, ship)
//! - Game clock and the day/tick orchestrator
//! - Snapshots and save files

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod config;
pub mod economy;
pub mod forage;
pub mod grid;
pub mod interaction;
pub mod inventory;
pub mod plants;
pub mod player;
pub mod save;
pub mod simulation;
pub mod time;


/// Prelude for convenient imports
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::config::*;
    pub use crate::economy::*;
    pub use crate::forage::*;
    pub use crate::grid::*;
    pub use crate::interaction::*;
    pub use crate::inventory::*;
    pub use crate::plants::*;
    pub use crate::player::*;
    pub use crate::save::*;
    pub use crate::simulation::*;
    pub use crate::time::*;
}

pub use prelude::*;
