//! Identifier types for registry kinds and inventory items.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Suffix used by the string form of seed items.
pub const SEED_SUFFIX: &str = "_seeds";

/// Identifier of a plant or forage kind in the catalog (e.g. `"carrot"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KindId(String);

impl KindId {
    /// Creates a kind identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KindId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for KindId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// An inventory item.
///
/// Harvested crops and foraged goods share one namespace and are identified by
/// the kind that produced them. Seeds are tied to the plant kind they grow.
/// The string form keeps the `<kind>_seeds` convention for seeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ItemId {
    /// A harvested crop or foraged good.
    Produce(KindId),
    /// Seeds for the given plant kind.
    Seeds(KindId),
}

impl ItemId {
    /// Item produced by harvesting or foraging the given kind.
    #[must_use]
    pub fn produce(kind: impl Into<KindId>) -> Self {
        Self::Produce(kind.into())
    }

    /// Seed item for the given plant kind.
    #[must_use]
    pub fn seeds_for(kind: impl Into<KindId>) -> Self {
        Self::Seeds(kind.into())
    }

    /// Whether this item is a seed. Seeds are never shipped.
    #[must_use]
    pub const fn is_seed(&self) -> bool {
        matches!(self, Self::Seeds(_))
    }

    /// The plant kind this seed grows, if it is a seed.
    #[must_use]
    pub const fn seed_of(&self) -> Option<&KindId> {
        match self {
            Self::Seeds(kind) => Some(kind),
            Self::Produce(_) => None,
        }
    }

    /// The kind this item belongs to.
    #[must_use]
    pub const fn kind(&self) -> &KindId {
        match self {
            Self::Produce(kind) | Self::Seeds(kind) => kind,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Produce(kind) => write!(f, "{kind}"),
            Self::Seeds(kind) => write!(f, "{kind}{SEED_SUFFIX}"),
        }
    }
}

impl From<ItemId> for String {
    fn from(value: ItemId) -> Self {
        value.to_string()
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        match value.strip_suffix(SEED_SUFFIX) {
            Some(kind) if !kind.is_empty() => Self::Seeds(KindId::new(kind)),
            _ => Self::Produce(KindId(value)),
        }
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl FromStr for ItemId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
