//! Player money.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Economy error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EconomyError {
    /// Insufficient funds
    #[error("Insufficient funds: need {needed}, have {have}")]
    InsufficientFunds {
        /// Amount needed
        needed: u64,
        /// Amount available
        have: u64,
    },
}

/// Result type for economy operations.
pub type EconomyResult<T> = Result<T, EconomyError>;

/// A wallet holding the player's money. The balance can never go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wallet {
    balance: u64,
}

impl Wallet {
    /// Creates a wallet with a starting balance.
    #[must_use]
    pub const fn new(balance: u64) -> Self {
        Self { balance }
    }

    /// Returns the current balance.
    #[must_use]
    pub const fn balance(&self) -> u64 {
        self.balance
    }

    /// Whether `amount` can be spent.
    #[must_use]
    pub const fn can_afford(&self, amount: u64) -> bool {
        self.balance >= amount
    }

    /// Adds money to the wallet.
    pub fn earn(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Removes money from the wallet. Leaves it untouched on failure.
    pub fn spend(&mut self, amount: u64) -> EconomyResult<()> {
        if !self.can_afford(amount) {
            return Err(EconomyError::InsufficientFunds {
                needed: amount,
                have: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }
}
