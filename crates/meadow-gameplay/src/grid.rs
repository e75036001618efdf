//! The field grid and per-cell state.
//!
//! A cell is exactly one of empty, planted or holding forage. Crop and forage
//! data live inside the variant, so an emptied cell carries no leftovers from
//! what used to grow on it.

use meadow_common::{KindId, Position};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Grid error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Position outside the field
    #[error("position {position} is outside the {width}x{height} field")]
    OutOfBounds {
        /// Rejected position
        position: Position,
        /// Field width
        width: u32,
        /// Field height
        height: u32,
    },
}

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;

/// Discriminant of a cell's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    /// Nothing here
    Empty,
    /// A crop is growing
    Planted,
    /// A forage item is lying here
    Forage,
}

impl CellType {
    /// Lowercase name used in save files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Planted => "planted",
            Self::Forage => "forage",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A crop growing in a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crop {
    /// Plant kind.
    pub kind: KindId,
    /// Current stage, starting at 0.
    pub growth_stage: u32,
    /// Whether the current stage has been watered.
    pub watered: bool,
    /// Ticks accumulated in the current stage.
    pub plant_timer: u32,
}

impl Crop {
    /// A freshly planted seed.
    #[must_use]
    pub fn new(kind: KindId) -> Self {
        Self {
            kind,
            growth_stage: 0,
            watered: false,
            plant_timer: 0,
        }
    }
}

/// A forage item lying in a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForageSpot {
    /// Forage kind.
    pub kind: KindId,
    /// Tick at which it appeared.
    pub spawn_tick: u32,
}

/// Full state of one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellState {
    /// Nothing here.
    #[default]
    Empty,
    /// A crop is growing.
    Planted(Crop),
    /// A forage item can be picked up.
    Forage(ForageSpot),
}

impl CellState {
    /// A freshly planted cell.
    #[must_use]
    pub fn planted(kind: KindId) -> Self {
        Self::Planted(Crop::new(kind))
    }

    /// A cell holding forage spawned at `spawn_tick`.
    #[must_use]
    pub fn forage(kind: KindId, spawn_tick: u32) -> Self {
        Self::Forage(ForageSpot { kind, spawn_tick })
    }

    /// The discriminant of this cell.
    #[must_use]
    pub fn cell_type(&self) -> CellType {
        match self {
            Self::Empty => CellType::Empty,
            Self::Planted(_) => CellType::Planted,
            Self::Forage(_) => CellType::Forage,
        }
    }

    /// Whether nothing occupies this cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The crop in this cell, if any.
    #[must_use]
    pub fn crop(&self) -> Option<&Crop> {
        match self {
            Self::Planted(crop) => Some(crop),
            _ => None,
        }
    }

    /// The forage in this cell, if any.
    #[must_use]
    pub fn forage_spot(&self) -> Option<&ForageSpot> {
        match self {
            Self::Forage(spot) => Some(spot),
            _ => None,
        }
    }
}

/// Fixed-size field of cells, indexed row-major by `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<CellState>,
}

impl Grid {
    /// Creates an all-empty field.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![CellState::Empty; width as usize * height as usize],
        }
    }

    /// Field width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Field height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether `pos` lies inside the field.
    #[must_use]
    pub fn is_valid_position(&self, pos: Position) -> bool {
        pos.to_index(self.width, self.height).is_some()
    }

    fn index(&self, pos: Position) -> GridResult<usize> {
        pos.to_index(self.width, self.height)
            .ok_or(GridError::OutOfBounds {
                position: pos,
                width: self.width,
                height: self.height,
            })
    }

    /// Returns the cell at `pos`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, pos: Position) -> Option<&CellState> {
        let index = pos.to_index(self.width, self.height)?;
        self.cells.get(index)
    }

    /// Mutable access for engine components inside this crate.
    pub(crate) fn get_mut(&mut self, pos: Position) -> Option<&mut CellState> {
        let index = pos.to_index(self.width, self.height)?;
        self.cells.get_mut(index)
    }

    /// Replaces the cell at `pos`.
    pub fn set(&mut self, pos: Position, cell: CellState) -> GridResult<()> {
        let index = self.index(pos)?;
        self.cells[index] = cell;
        Ok(())
    }

    /// Resets the cell at `pos` to empty, returning what was there.
    pub fn clear(&mut self, pos: Position) -> GridResult<CellState> {
        let index = self.index(pos)?;
        Ok(std::mem::take(&mut self.cells[index]))
    }

    /// Whether a seed can be planted at `pos`.
    #[must_use]
    pub fn can_plant_at(&self, pos: Position) -> bool {
        self.get(pos).is_some_and(CellState::is_empty)
    }

    /// Whether a crop (ripe or not) is at `pos`.
    #[must_use]
    pub fn can_harvest_at(&self, pos: Position) -> bool {
        self.get(pos).and_then(CellState::crop).is_some()
    }

    /// Whether forage can be picked up at `pos`.
    #[must_use]
    pub fn can_forage_at(&self, pos: Position) -> bool {
        self.get(pos).and_then(CellState::forage_spot).is_some()
    }

    /// Iterates over every cell with its position, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &CellState)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (Position::from_index(i, width), cell))
    }

    /// Mutable iteration for engine components inside this crate.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (Position, &mut CellState)> + '_ {
        let width = self.width;
        self.cells
            .iter_mut()
            .enumerate()
            .map(move |(i, cell)| (Position::from_index(i, width), cell))
    }

    /// Iterates over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[CellState]> + '_ {
        self.cells.chunks(self.width.max(1) as usize)
    }

    /// Number of cells of the given type.
    #[must_use]
    pub fn count_by_type(&self, cell_type: CellType) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.cell_type() == cell_type)
            .count()
    }

    /// Replaces every cell at once. `cells` must hold exactly width x height entries.
    pub(crate) fn replace_cells(&mut self, cells: Vec<CellState>) {
        debug_assert_eq!(cells.len(), self.cells.len());
        self.cells = cells;
    }
}
