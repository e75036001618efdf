//! Plant and forage registries.
//!
//! The catalog is immutable process-wide configuration: it is built once at
//! startup (from the built-in tables or a TOML file) and shared read-only by
//! every engine component. Registry order is significant: the forage spawner
//! evaluates kinds in the order they appear here.

use meadow_common::{ItemId, KindId, SEED_SUFFIX};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors raised while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failed to read catalog file.
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse catalog TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A kind id appears more than once.
    #[error("Duplicate kind id: {0}")]
    DuplicateId(KindId),

    /// A definition failed validation.
    #[error("Invalid definition for {id}: {reason}")]
    Invalid {
        /// Offending kind
        id: KindId,
        /// What is wrong with it
        reason: String,
    },
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Rarity tier of a forage kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    /// Spawns often
    Common,
    /// Spawns occasionally
    Uncommon,
    /// Spawns seldom
    Rare,
    /// Almost never spawns
    Legendary,
}

impl Rarity {
    /// Get the display name of this rarity.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::Legendary => "Legendary",
        }
    }
}

/// Definition of a plantable crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantKind {
    /// Unique identifier.
    pub id: KindId,
    /// Display name.
    pub name: String,
    /// Number of growth stages; the last one is harvestable.
    pub growth_stages: u32,
    /// Game minutes (ticks) spent in each stage.
    pub minutes_per_stage: u32,
    /// Stage indices that must be watered before the plant can progress.
    #[serde(default)]
    pub watering_stages: Vec<u32>,
    /// Price paid per harvested unit when shipped.
    pub sell_price: u64,
    /// Price of one seed at the shop (also charged again when planting).
    #[serde(default)]
    pub seed_cost: u64,
}

impl PlantKind {
    /// Create a new plant kind builder.
    #[must_use]
    pub fn builder(id: impl Into<KindId>, name: &str) -> PlantKindBuilder {
        PlantKindBuilder::new(id.into(), name)
    }

    /// Index of the final, harvestable stage.
    #[must_use]
    pub fn final_stage(&self) -> u32 {
        self.growth_stages.saturating_sub(1)
    }

    /// Whether a plant at `stage` is ready to harvest.
    #[must_use]
    pub fn is_mature(&self, stage: u32) -> bool {
        stage >= self.final_stage()
    }

    /// Whether `stage` requires watering before the plant progresses.
    #[must_use]
    pub fn needs_water_at(&self, stage: u32) -> bool {
        self.watering_stages.contains(&stage)
    }

    /// Total game minutes from planting to harvest, ignoring watering delays.
    #[must_use]
    pub fn total_growth_minutes(&self) -> u64 {
        u64::from(self.final_stage()) * u64::from(self.minutes_per_stage)
    }

    /// The seed item that grows this plant.
    #[must_use]
    pub fn seed_item(&self) -> ItemId {
        ItemId::seeds_for(self.id.clone())
    }

    /// The item produced when this plant is harvested.
    #[must_use]
    pub fn harvest_item(&self) -> ItemId {
        ItemId::produce(self.id.clone())
    }

    fn validate(&self) -> CatalogResult<()> {
        let invalid = |reason: &str| CatalogError::Invalid {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.growth_stages == 0 {
            return Err(invalid("growth_stages must be at least 1"));
        }
        if self.minutes_per_stage == 0 {
            return Err(invalid("minutes_per_stage must be at least 1"));
        }
        if let Some(stage) = self
            .watering_stages
            .iter()
            .find(|&&stage| stage >= self.growth_stages)
        {
            return Err(invalid(&format!(
                "watering stage {stage} is beyond the last stage {}",
                self.final_stage()
            )));
        }
        Ok(())
    }
}

/// Builder for plant kinds.
#[derive(Debug)]
pub struct PlantKindBuilder {
    def: PlantKind,
}

impl PlantKindBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(id: KindId, name: &str) -> Self {
        Self {
            def: PlantKind {
                id,
                name: name.to_string(),
                growth_stages: 3,
                minutes_per_stage: 60,
                watering_stages: vec![0],
                sell_price: 0,
                seed_cost: 0,
            },
        }
    }

    /// Set stage count and minutes per stage.
    #[must_use]
    pub fn stages(mut self, growth_stages: u32, minutes_per_stage: u32) -> Self {
        self.def.growth_stages = growth_stages;
        self.def.minutes_per_stage = minutes_per_stage;
        self
    }

    /// Set which stages require watering.
    #[must_use]
    pub fn water_at(mut self, stages: &[u32]) -> Self {
        self.def.watering_stages = stages.to_vec();
        self
    }

    /// Set sell price and seed cost.
    #[must_use]
    pub fn prices(mut self, sell_price: u64, seed_cost: u64) -> Self {
        self.def.sell_price = sell_price;
        self.def.seed_cost = seed_cost;
        self
    }

    /// Build the plant kind.
    #[must_use]
    pub fn build(self) -> PlantKind {
        self.def
    }
}

/// Definition of a forage item that spawns on empty cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForageKind {
    /// Unique identifier.
    pub id: KindId,
    /// Display name.
    pub name: String,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Spawn weight, divided by [`SPAWN_RATE_DIVISOR`] to get the per-tick chance.
    pub spawn_probability: f64,
    /// Price paid per unit when shipped.
    pub sell_price: u64,
    /// Game minutes before an uncollected spawn disappears.
    pub respawn_minutes: u32,
}

/// Tick-to-probability conversion factor for forage spawning.
///
/// Every empty cell rolls once per kind per tick, so configured probabilities
/// are scaled down by this factor to keep the field from filling up.
pub const SPAWN_RATE_DIVISOR: f64 = 1000.0;

impl ForageKind {
    /// Chance that this kind spawns on a given empty cell during one tick.
    #[must_use]
    pub fn spawn_chance(&self) -> f64 {
        self.spawn_probability / SPAWN_RATE_DIVISOR
    }

    /// The item collected when this forage is picked up.
    #[must_use]
    pub fn item(&self) -> ItemId {
        ItemId::produce(self.id.clone())
    }

    /// Whether a spawn placed at `spawn_tick` has expired by `current_tick`.
    #[must_use]
    pub fn is_expired(&self, spawn_tick: u32, current_tick: u32) -> bool {
        current_tick.saturating_sub(spawn_tick) >= self.respawn_minutes
    }

    fn validate(&self) -> CatalogResult<()> {
        if !(0.0..=SPAWN_RATE_DIVISOR).contains(&self.spawn_probability) {
            return Err(CatalogError::Invalid {
                id: self.id.clone(),
                reason: format!(
                    "spawn_probability {} outside 0..={SPAWN_RATE_DIVISOR}",
                    self.spawn_probability
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    plants: Vec<PlantKind>,
    #[serde(default)]
    forage: Vec<ForageKind>,
}

/// Immutable registry of plant and forage kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    plants: Vec<PlantKind>,
    forage: Vec<ForageKind>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            plants: default_plants(),
            forage: default_forage(),
        }
    }
}

impl Catalog {
    /// Build a catalog from explicit registries, validating every entry.
    pub fn new(plants: Vec<PlantKind>, forage: Vec<ForageKind>) -> CatalogResult<Self> {
        let mut seen = HashSet::new();
        for id in plants.iter().map(|p| &p.id).chain(forage.iter().map(|f| &f.id)) {
            if !seen.insert(id) {
                return Err(CatalogError::DuplicateId(id.clone()));
            }
            // Such a produce item would read back as seeds.
            if id.as_str().ends_with(SEED_SUFFIX) {
                return Err(CatalogError::Invalid {
                    id: id.clone(),
                    reason: format!("ids may not end in `{SEED_SUFFIX}`"),
                });
            }
        }
        for plant in &plants {
            plant.validate()?;
        }
        for kind in &forage {
            kind.validate()?;
        }
        Ok(Self { plants, forage })
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(text: &str) -> CatalogResult<Self> {
        let file: CatalogFile = toml::from_str(text)?;
        Self::new(file.plants, file.forage)
    }

    /// Load a catalog from a TOML file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&text)?;
        info!(
            "Loaded catalog from {} ({} plants, {} forage kinds)",
            path.display(),
            catalog.plants.len(),
            catalog.forage.len()
        );
        Ok(catalog)
    }

    /// Serialize this catalog as TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Look up a plant kind.
    #[must_use]
    pub fn plant(&self, id: &KindId) -> Option<&PlantKind> {
        self.plants.iter().find(|p| &p.id == id)
    }

    /// Look up a forage kind.
    #[must_use]
    pub fn forage(&self, id: &KindId) -> Option<&ForageKind> {
        self.forage.iter().find(|f| &f.id == id)
    }

    /// Plant kinds in registry order.
    #[must_use]
    pub fn plants(&self) -> &[PlantKind] {
        &self.plants
    }

    /// Forage kinds in registry order.
    #[must_use]
    pub fn forage_kinds(&self) -> &[ForageKind] {
        &self.forage
    }

    /// Shipping value of one unit of `item`.
    ///
    /// Seeds are worth nothing here; unknown items are worth nothing.
    #[must_use]
    pub fn sell_price(&self, item: &ItemId) -> Option<u64> {
        match item {
            ItemId::Seeds(_) => None,
            ItemId::Produce(kind) => self
                .plant(kind)
                .map(|p| p.sell_price)
                .or_else(|| self.forage(kind).map(|f| f.sell_price)),
        }
    }

    /// Human-readable name for an item.
    #[must_use]
    pub fn item_name(&self, item: &ItemId) -> String {
        let kind = item.kind();
        let base = self
            .plant(kind)
            .map(|p| p.name.clone())
            .or_else(|| self.forage(kind).map(|f| f.name.clone()))
            .unwrap_or_else(|| kind.to_string());
        if item.is_seed() {
            format!("{base} Seeds")
        } else {
            base
        }
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let file = CatalogFile::deserialize(deserializer)?;
        Self::new(file.plants, file.forage).map_err(serde::de::Error::custom)
    }
}

fn default_plants() -> Vec<PlantKind> {
    vec![
        PlantKind::builder("carrot", "Carrot")
            .stages(3, 40)
            .water_at(&[0])
            .prices(25, 1)
            .build(),
        PlantKind::builder("tomato", "Tomato")
            .stages(4, 75)
            .water_at(&[0, 2])
            .prices(50, 2)
            .build(),
        PlantKind::builder("melon", "Melon")
            .stages(5, 120)
            .water_at(&[0, 2, 3])
            .prices(100, 5)
            .build(),
        PlantKind::builder("gigantic_pumpkin", "Gigantic Pumpkin")
            .stages(7, 128)
            .water_at(&[0, 2, 3, 4, 5])
            .prices(1000, 500)
            .build(),
    ]
}

fn default_forage() -> Vec<ForageKind> {
    let kind = |id: &str, name: &str, rarity, spawn_probability, sell_price, respawn_minutes| {
        ForageKind {
            id: KindId::new(id),
            name: name.to_string(),
            rarity,
            spawn_probability,
            sell_price,
            respawn_minutes,
        }
    };
    vec![
        kind("wild_berries", "Wild Berries", Rarity::Common, 0.08, 15, 60),
        kind("herbs", "Wild Herbs", Rarity::Common, 0.07, 12, 80),
        kind("mushrooms", "Mushrooms", Rarity::Uncommon, 0.04, 30, 120),
        kind("flowers", "Wild Flowers", Rarity::Uncommon, 0.03, 25, 100),
        kind("crystals", "Crystals", Rarity::Rare, 0.015, 120, 300),
        kind("ancient_coin", "Ancient Coin", Rarity::Rare, 0.008, 180, 350),
        kind("golden_artifact", "Golden Artifact", Rarity::Legendary, 0.003, 600, 600),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_contents() {
        let catalog = Catalog::default();
        assert_eq!(catalog.plants().len(), 4);
        assert_eq!(catalog.forage_kinds().len(), 7);

        let carrot = catalog.plant(&KindId::new("carrot")).expect("carrot");
        assert_eq!(carrot.growth_stages, 3);
        assert_eq!(carrot.minutes_per_stage, 40);
        assert_eq!(carrot.seed_cost, 1);
        assert_eq!(carrot.final_stage(), 2);

        let pumpkin = catalog.plant(&KindId::new("gigantic_pumpkin")).expect("pumpkin");
        assert_eq!(pumpkin.final_stage(), 6);
        assert!(pumpkin.needs_water_at(5));
        assert!(!pumpkin.needs_water_at(1));
    }

    #[test]
    fn test_forage_registry_order_is_stable() {
        let catalog = Catalog::default();
        let ids: Vec<&str> = catalog.forage_kinds().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "wild_berries",
                "herbs",
                "mushrooms",
                "flowers",
                "crystals",
                "ancient_coin",
                "golden_artifact"
            ]
        );
    }

    #[test]
    fn test_spawn_chance_scaling() {
        let catalog = Catalog::default();
        let berries = catalog.forage(&KindId::new("wild_berries")).expect("berries");
        assert!((berries.spawn_chance() - 0.000_08).abs() < 1e-12);
    }

    #[test]
    fn test_forage_expiry_boundary() {
        let kind = ForageKind {
            id: KindId::new("test"),
            name: "Test".into(),
            rarity: Rarity::Common,
            spawn_probability: 1.0,
            sell_price: 1,
            respawn_minutes: 60,
        };
        assert!(!kind.is_expired(100, 159));
        assert!(kind.is_expired(100, 160));
        // Ticks that wrapped past midnight never count as expired early.
        assert!(!kind.is_expired(800, 5));
    }

    #[test]
    fn test_sell_price_lookup() {
        let catalog = Catalog::default();
        assert_eq!(catalog.sell_price(&ItemId::produce("carrot")), Some(25));
        assert_eq!(catalog.sell_price(&ItemId::produce("crystals")), Some(120));
        assert_eq!(catalog.sell_price(&ItemId::seeds_for("carrot")), None);
        assert_eq!(catalog.sell_price(&ItemId::produce("rocks")), None);
    }

    #[test]
    fn test_item_names() {
        let catalog = Catalog::default();
        assert_eq!(catalog.item_name(&ItemId::seeds_for("melon")), "Melon Seeds");
        assert_eq!(catalog.item_name(&ItemId::produce("herbs")), "Wild Herbs");
        assert_eq!(catalog.item_name(&ItemId::produce("rocks")), "rocks");
    }

    #[test]
    fn test_catalog_from_toml() {
        let text = r#"
            [[plants]]
            id = "radish"
            name = "Radish"
            growth_stages = 2
            minutes_per_stage = 10
            watering_stages = [0]
            sell_price = 8
            seed_cost = 1

            [[forage]]
            id = "acorn"
            name = "Acorn"
            rarity = "common"
            spawn_probability = 0.5
            sell_price = 2
            respawn_minutes = 30
        "#;
        let catalog = Catalog::from_toml_str(text).expect("parse");
        assert_eq!(catalog.plants().len(), 1);
        assert_eq!(
            catalog.forage(&KindId::new("acorn")).expect("acorn").rarity,
            Rarity::Common
        );
    }

    #[test]
    fn test_default_catalog_toml_roundtrip() {
        let catalog = Catalog::default();
        let text = catalog.to_toml_string().expect("serialize");
        let parsed = Catalog::from_toml_str(&text).expect("parse");
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_catalog_rejects_seed_suffixed_ids() {
        let plant = PlantKind::builder("pumpkin_seeds", "Pumpkin Seeds").build();
        assert!(matches!(
            Catalog::new(vec![plant], vec![]),
            Err(CatalogError::Invalid { .. })
        ));

        let text = r#"
            [[forage]]
            id = "sunflower_seeds"
            name = "Sunflower Seeds"
            rarity = "common"
            spawn_probability = 1.0
            sell_price = 3
            respawn_minutes = 30
        "#;
        assert!(matches!(
            Catalog::from_toml_str(text),
            Err(CatalogError::Invalid { .. })
        ));
    }

    #[test]
    fn test_catalog_rejects_invalid_definitions() {
        let zero_stages = PlantKind::builder("bad", "Bad").stages(0, 10).build();
        assert!(matches!(
            Catalog::new(vec![zero_stages], vec![]),
            Err(CatalogError::Invalid { .. })
        ));

        let late_water = PlantKind::builder("bad", "Bad").stages(2, 10).water_at(&[2]).build();
        assert!(Catalog::new(vec![late_water], vec![]).is_err());

        let carrot = PlantKind::builder("carrot", "Carrot").build();
        let dup = ForageKind {
            id: KindId::new("carrot"),
            name: "Wild Carrot".into(),
            rarity: Rarity::Rare,
            spawn_probability: 1.0,
            sell_price: 1,
            respawn_minutes: 1,
        };
        assert!(matches!(
            Catalog::new(vec![carrot], vec![dup]),
            Err(CatalogError::DuplicateId(_))
        ));
    }
}
