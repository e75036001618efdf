//! Plant growth engine.
//!
//! Crops advance one tick at a time:
//! - A stage listed in the kind's watering stages holds still until watered
//! - Otherwise the stage timer counts up once per tick
//! - A full timer moves the crop to the next stage and clears `watered`
//! - The final stage is harvestable and never advances further

use meadow_common::{KindId, Position};
use std::sync::Arc;
use tracing::debug;

use crate::catalog::{Catalog, PlantKind};
use crate::grid::{CellState, Crop, Grid};

/// A crop that moved to a new stage during an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageAdvance {
    /// Where the crop is.
    pub position: Position,
    /// Plant kind.
    pub kind: KindId,
    /// The stage it reached.
    pub stage: u32,
    /// Whether that stage is the harvestable one.
    pub mature: bool,
}

/// Outcome of advancing one crop by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthTick {
    /// Current stage needs water that has not been given.
    WaitingForWater,
    /// Already at the final stage.
    Mature,
    /// Timer moved forward within the stage.
    Grew,
    /// Timer filled and the crop entered a new stage.
    Advanced,
}

/// Advances crops on the grid using the plant registry.
#[derive(Debug, Clone)]
pub struct PlantGrowth {
    catalog: Arc<Catalog>,
}

impl PlantGrowth {
    /// Create a growth engine over the given catalog.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Advance every planted cell by one tick.
    ///
    /// Cells whose plant kind is not registered are left untouched.
    pub fn update(&self, grid: &mut Grid) -> Vec<StageAdvance> {
        let mut advances = Vec::new();

        for (position, cell) in grid.iter_mut() {
            let CellState::Planted(crop) = cell else {
                continue;
            };
            let Some(kind) = self.catalog.plant(&crop.kind) else {
                continue;
            };

            if Self::tick_crop(kind, crop) == GrowthTick::Advanced {
                debug!(
                    "{} at {} reached stage {}/{}",
                    kind.id,
                    position,
                    crop.growth_stage,
                    kind.final_stage()
                );
                advances.push(StageAdvance {
                    position,
                    kind: crop.kind.clone(),
                    stage: crop.growth_stage,
                    mature: kind.is_mature(crop.growth_stage),
                });
            }
        }

        advances
    }

    /// Advance a single crop by one tick.
    pub fn tick_crop(kind: &PlantKind, crop: &mut Crop) -> GrowthTick {
        if kind.needs_water_at(crop.growth_stage) && !crop.watered {
            return GrowthTick::WaitingForWater;
        }

        // A matured crop keeps counting, but nothing comes of it.
        crop.plant_timer = crop.plant_timer.saturating_add(1);

        if kind.is_mature(crop.growth_stage) {
            return GrowthTick::Mature;
        }
        if crop.plant_timer < kind.minutes_per_stage {
            return GrowthTick::Grew;
        }

        crop.growth_stage += 1;
        crop.plant_timer = 0;
        crop.watered = false;
        GrowthTick::Advanced
    }

    /// Fractional completion of the crop at `pos`, in `0.0..=1.0`.
    ///
    /// `None` if there is no crop there or its kind is unknown.
    #[must_use]
    pub fn growth_progress(&self, grid: &Grid, pos: Position) -> Option<f32> {
        let crop = grid.get(pos)?.crop()?;
        let kind = self.catalog.plant(&crop.kind)?;
        Some(Self::progress_of(kind, crop))
    }

    /// Fractional completion of a crop of the given kind.
    #[must_use]
    pub fn progress_of(kind: &PlantKind, crop: &Crop) -> f32 {
        let stage_progress = crop.plant_timer as f32 / kind.minutes_per_stage.max(1) as f32;
        let total = (crop.growth_stage as f32 + stage_progress) / kind.growth_stages.max(1) as f32;
        total.clamp(0.0, 1.0)
    }

    /// Whether the crop at `pos` is registered and at its final stage.
    #[must_use]
    pub fn is_ready(&self, grid: &Grid, pos: Position) -> bool {
        grid.get(pos)
            .and_then(CellState::crop)
            .and_then(|crop| {
                self.catalog
                    .plant(&crop.kind)
                    .map(|kind| kind.is_mature(crop.growth_stage))
            })
            .unwrap_or(false)
    }

    /// Positions of every crop ready to harvest.
    #[must_use]
    pub fn harvestable(&self, grid: &Grid) -> Vec<Position> {
        grid.iter()
            .filter(|(pos, _)| self.is_ready(grid, *pos))
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Whether a crop of `kind` sits at its final stage anywhere on the grid.
    #[must_use]
    pub fn has_mature(&self, grid: &Grid, kind: &KindId) -> bool {
        let Some(plant) = self.catalog.plant(kind) else {
            return false;
        };
        grid.iter().any(|(_, cell)| {
            cell.crop()
                .is_some_and(|crop| &crop.kind == kind && plant.is_mature(crop.growth_stage))
        })
    }
}
