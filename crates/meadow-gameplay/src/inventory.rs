//! Inventory system.

use meadow_common::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Inventory error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Not enough items
    #[error("Not enough {item}: need {needed}, have {have}")]
    NotEnough {
        /// Item requested
        item: ItemId,
        /// Amount needed
        needed: u32,
        /// Amount available
        have: u32,
    },
    /// Zero quantities are never stored or moved
    #[error("Quantity must be positive")]
    ZeroQuantity,
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Item counts keyed by item.
///
/// Every stored quantity is positive: an entry that reaches zero is removed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ItemId, u32>", into = "BTreeMap<ItemId, u32>")]
pub struct Inventory {
    items: BTreeMap<ItemId, u32>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of distinct items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the inventory holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the count of a specific item.
    #[must_use]
    pub fn count(&self, item: &ItemId) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    /// Checks if the inventory contains at least the given amount.
    #[must_use]
    pub fn has(&self, item: &ItemId, amount: u32) -> bool {
        self.count(item) >= amount
    }

    /// Adds items to the inventory.
    pub fn add(&mut self, item: ItemId, amount: u32) -> InventoryResult<()> {
        if amount == 0 {
            return Err(InventoryError::ZeroQuantity);
        }
        let entry = self.items.entry(item).or_insert(0);
        *entry = entry.saturating_add(amount);
        Ok(())
    }

    /// Removes items from the inventory.
    pub fn remove(&mut self, item: &ItemId, amount: u32) -> InventoryResult<()> {
        if amount == 0 {
            return Err(InventoryError::ZeroQuantity);
        }
        let current = self.count(item);
        if current < amount {
            return Err(InventoryError::NotEnough {
                item: item.clone(),
                needed: amount,
                have: current,
            });
        }
        if current == amount {
            self.items.remove(item);
        } else {
            self.items.insert(item.clone(), current - amount);
        }
        Ok(())
    }

    /// Removes and returns every entry matching `pred`.
    pub fn take_where<F>(&mut self, mut pred: F) -> Vec<(ItemId, u32)>
    where
        F: FnMut(&ItemId, u32) -> bool,
    {
        let keys: Vec<ItemId> = self
            .items
            .iter()
            .filter(|(item, &count)| pred(item, count))
            .map(|(item, _)| item.clone())
            .collect();
        keys.into_iter()
            .filter_map(|item| self.items.remove(&item).map(|count| (item, count)))
            .collect()
    }

    /// Returns an iterator over all items in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, u32)> + '_ {
        self.items.iter().map(|(id, &count)| (id, count))
    }
}

impl From<BTreeMap<ItemId, u32>> for Inventory {
    fn from(mut items: BTreeMap<ItemId, u32>) -> Self {
        items.retain(|_, count| *count > 0);
        Self { items }
    }
}

impl From<Inventory> for BTreeMap<ItemId, u32> {
    fn from(inventory: Inventory) -> Self {
        inventory.items
    }
}

impl FromIterator<(ItemId, u32)> for Inventory {
    fn from_iter<T: IntoIterator<Item = (ItemId, u32)>>(iter: T) -> Self {
        let mut inventory = Self::new();
        for (item, count) in iter {
            // Zero counts are dropped rather than stored.
            let _ = inventory.add(item, count);
        }
        inventory
    }
}
