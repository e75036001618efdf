//! The player: where they stand, what they carry and how much money they have.

use meadow_common::{Direction, ItemId, Position};
use serde::{Deserialize, Serialize};

use crate::economy::Wallet;
use crate::grid::Grid;
use crate::inventory::Inventory;

/// The single farmer on the field.
///
/// The position always lies inside the grid the player moves on; `try_move`
/// refuses any step that would leave it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    position: Position,
    wallet: Wallet,
    inventory: Inventory,
}

impl Player {
    /// Create a player at `position` with a starting balance and inventory.
    #[must_use]
    pub fn new(position: Position, money: u64, inventory: Inventory) -> Self {
        Self {
            position,
            wallet: Wallet::new(money),
            inventory,
        }
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Current balance.
    #[must_use]
    pub const fn money(&self) -> u64 {
        self.wallet.balance()
    }

    /// The wallet.
    #[must_use]
    pub const fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Mutable wallet.
    pub fn wallet_mut(&mut self) -> &mut Wallet {
        &mut self.wallet
    }

    /// The inventory.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Mutable inventory.
    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    /// Seed items currently carried, in inventory order.
    pub fn seed_items(&self) -> impl Iterator<Item = &ItemId> + '_ {
        self.inventory
            .iter()
            .map(|(item, _)| item)
            .filter(|item| item.is_seed())
    }

    /// Step one cell in `direction`.
    ///
    /// Returns `false` and stays put if the destination is off the grid.
    pub fn try_move(&mut self, direction: Direction, grid: &Grid) -> bool {
        let target = self.position.step(direction);
        if !grid.is_valid_position(target) {
            return false;
        }
        self.position = target;
        true
    }

    /// Place the player at `position` if it lies on `grid`.
    pub fn teleport(&mut self, position: Position, grid: &Grid) -> bool {
        if !grid.is_valid_position(position) {
            return false;
        }
        self.position = position;
        true
    }
}
