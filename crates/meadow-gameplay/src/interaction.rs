//! Player actions on the field and at the shop.
//!
//! Every action checks all of its preconditions before touching anything, so
//! a failed action leaves the grid and the player exactly as they were.

use meadow_common::{ItemId, KindId, Position};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::grid::{CellState, Grid};
use crate::player::Player;

/// Why an action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    /// A generic precondition was not met
    #[error("that can't be done here")]
    NotPossible,
    /// The cell is already occupied
    #[error("something is already growing here")]
    AlreadyPlanted,
    /// The player has no seed of the requested kind
    #[error("no seeds of that kind")]
    NoSeeds,
    /// The player cannot afford it
    #[error("not enough money")]
    NoMoney,
    /// The crop has not reached its final stage
    #[error("not ready to harvest yet")]
    NotReady,
    /// Nothing to pick up here
    #[error("nothing to harvest here")]
    NothingToHarvest,
    /// A kind that should be registered was not
    #[error("action failed: {reason}")]
    Failed {
        /// What went wrong
        reason: String,
    },
}

impl InteractionError {
    fn unknown_kind(kind: &KindId) -> Self {
        Self::Failed {
            reason: format!("unknown kind '{kind}'"),
        }
    }
}

/// Result type for interactions.
pub type InteractionResult<T> = Result<T, InteractionError>;

/// Flat outcome of an action, success included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionOutcome {
    /// The action happened
    Success,
    /// See [`InteractionError::NotPossible`]
    NotPossible,
    /// See [`InteractionError::AlreadyPlanted`]
    AlreadyPlanted,
    /// See [`InteractionError::NoSeeds`]
    NoSeeds,
    /// See [`InteractionError::NoMoney`]
    NoMoney,
    /// See [`InteractionError::NotReady`]
    NotReady,
    /// See [`InteractionError::NothingToHarvest`]
    NothingToHarvest,
    /// See [`InteractionError::Failed`]
    Failed,
}

impl InteractionOutcome {
    /// Collapse a result into its outcome.
    #[must_use]
    pub fn of<T>(result: &InteractionResult<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(InteractionError::NotPossible) => Self::NotPossible,
            Err(InteractionError::AlreadyPlanted) => Self::AlreadyPlanted,
            Err(InteractionError::NoSeeds) => Self::NoSeeds,
            Err(InteractionError::NoMoney) => Self::NoMoney,
            Err(InteractionError::NotReady) => Self::NotReady,
            Err(InteractionError::NothingToHarvest) => Self::NothingToHarvest,
            Err(InteractionError::Failed { .. }) => Self::Failed,
        }
    }

    /// Stable name of the outcome.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotPossible => "not_possible",
            Self::AlreadyPlanted => "already_planted",
            Self::NoSeeds => "no_seeds",
            Self::NoMoney => "no_money",
            Self::NotReady => "not_ready",
            Self::NothingToHarvest => "nothing_to_harvest",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for InteractionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Performs player actions against the grid using the registries.
#[derive(Debug, Clone)]
pub struct InteractionManager {
    catalog: Arc<Catalog>,
}

impl InteractionManager {
    /// Create an interaction manager over the given catalog.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Off-field positions are invalid input, reported as `NotPossible`
    /// rather than as an occupied or empty cell.
    fn require_on_grid(grid: &Grid, pos: Position) -> InteractionResult<()> {
        if grid.is_valid_position(pos) {
            Ok(())
        } else {
            Err(InteractionError::NotPossible)
        }
    }

    /// Plant one seed of `kind` at `pos`.
    ///
    /// Costs one seed item and the kind's seed cost.
    pub fn plant_seed(
        &self,
        grid: &mut Grid,
        player: &mut Player,
        pos: Position,
        kind: &KindId,
    ) -> InteractionResult<()> {
        Self::require_on_grid(grid, pos)?;
        if !grid.can_plant_at(pos) {
            return Err(InteractionError::AlreadyPlanted);
        }
        let seed = ItemId::seeds_for(kind.clone());
        if !player.inventory().has(&seed, 1) {
            return Err(InteractionError::NoSeeds);
        }
        let Some(plant) = self.catalog.plant(kind) else {
            let err = InteractionError::unknown_kind(kind);
            warn!("plant_seed at {}: {}", pos, err);
            return Err(err);
        };
        if !player.wallet().can_afford(plant.seed_cost) {
            return Err(InteractionError::NoMoney);
        }

        player
            .wallet_mut()
            .spend(plant.seed_cost)
            .map_err(|_| InteractionError::NoMoney)?;
        player
            .inventory_mut()
            .remove(&seed, 1)
            .map_err(|_| InteractionError::NoSeeds)?;
        grid.set(pos, CellState::planted(kind.clone()))
            .map_err(|_| InteractionError::NotPossible)?;

        debug!("Planted {} at {}", kind, pos);
        Ok(())
    }

    /// Water the crop at `pos`.
    pub fn water_plant(&self, grid: &mut Grid, pos: Position) -> InteractionResult<()> {
        match grid.get_mut(pos) {
            Some(CellState::Planted(crop)) if !crop.watered => {
                crop.watered = true;
                debug!("Watered {} at {}", crop.kind, pos);
                Ok(())
            },
            _ => Err(InteractionError::NotPossible),
        }
    }

    /// Harvest the ripe crop at `pos` into the player's inventory.
    pub fn harvest_plant(
        &self,
        grid: &mut Grid,
        player: &mut Player,
        pos: Position,
    ) -> InteractionResult<()> {
        Self::require_on_grid(grid, pos)?;
        let Some(crop) = grid.get(pos).and_then(CellState::crop) else {
            return Err(InteractionError::NothingToHarvest);
        };
        let Some(plant) = self.catalog.plant(&crop.kind) else {
            let err = InteractionError::unknown_kind(&crop.kind);
            warn!("harvest_plant at {}: {}", pos, err);
            return Err(err);
        };
        if !plant.is_mature(crop.growth_stage) {
            return Err(InteractionError::NotReady);
        }

        player
            .inventory_mut()
            .add(plant.harvest_item(), 1)
            .map_err(|e| InteractionError::Failed {
                reason: e.to_string(),
            })?;
        grid.clear(pos).map_err(|_| InteractionError::NotPossible)?;

        debug!("Harvested {} at {}", plant.id, pos);
        Ok(())
    }

    /// Pick up the forage item at `pos`.
    pub fn forage_item(
        &self,
        grid: &mut Grid,
        player: &mut Player,
        pos: Position,
    ) -> InteractionResult<()> {
        Self::require_on_grid(grid, pos)?;
        let Some(spot) = grid.get(pos).and_then(CellState::forage_spot) else {
            return Err(InteractionError::NothingToHarvest);
        };
        let Some(kind) = self.catalog.forage(&spot.kind) else {
            let err = InteractionError::unknown_kind(&spot.kind);
            warn!("forage_item at {}: {}", pos, err);
            return Err(err);
        };
        let item = kind.item();

        player
            .inventory_mut()
            .add(item.clone(), 1)
            .map_err(|e| InteractionError::Failed {
                reason: e.to_string(),
            })?;
        grid.clear(pos).map_err(|_| InteractionError::NotPossible)?;

        debug!("Foraged {} at {}", item, pos);
        Ok(())
    }

    /// Buy `quantity` seeds of `kind`.
    pub fn buy_seeds(
        &self,
        player: &mut Player,
        kind: &KindId,
        quantity: u32,
    ) -> InteractionResult<()> {
        let Some(plant) = self.catalog.plant(kind) else {
            return Err(InteractionError::NotPossible);
        };
        if quantity == 0 {
            return Err(InteractionError::NotPossible);
        }
        let cost = plant
            .seed_cost
            .checked_mul(u64::from(quantity))
            .ok_or(InteractionError::NoMoney)?;
        if !player.wallet().can_afford(cost) {
            return Err(InteractionError::NoMoney);
        }

        player
            .wallet_mut()
            .spend(cost)
            .map_err(|_| InteractionError::NoMoney)?;
        player
            .inventory_mut()
            .add(plant.seed_item(), quantity)
            .map_err(|e| InteractionError::Failed {
                reason: e.to_string(),
            })?;

        debug!("Bought {} {} for ${}", quantity, plant.seed_item(), cost);
        Ok(())
    }

    /// Sell every shippable item the player carries and return the earnings.
    ///
    /// Seeds are never shipped. Items with no known price stay in the
    /// inventory.
    pub fn ship_items(&self, player: &mut Player) -> u64 {
        let catalog = &self.catalog;
        let shipped = player
            .inventory_mut()
            .take_where(|item, _| catalog.sell_price(item).is_some());

        let total = shipped
            .iter()
            .map(|(item, count)| {
                catalog
                    .sell_price(item)
                    .unwrap_or(0)
                    .saturating_mul(u64::from(*count))
            })
            .fold(0u64, u64::saturating_add);

        if total > 0 {
            player.wallet_mut().earn(total);
            debug!("Shipped {} item kinds for ${}", shipped.len(), total);
        }
        total
    }
}
