//! Grid coordinates and movement directions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Cell coordinate on the field grid.
///
/// Signed so that a step off the top or left edge is representable and can be
/// rejected by bounds checks instead of wrapping around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the position one step in the given direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Converts to a linear row-major index for a grid of the given size.
    ///
    /// Returns `None` when the position is outside `width` x `height`.
    #[must_use]
    pub fn to_index(self, width: u32, height: u32) -> Option<usize> {
        let x = u32::try_from(self.x).ok()?;
        let y = u32::try_from(self.y).ok()?;
        if x >= width || y >= height {
            return None;
        }
        Some(y as usize * width as usize + x as usize)
    }

    /// Creates a position from a linear row-major index.
    #[must_use]
    pub const fn from_index(index: usize, width: u32) -> Self {
        let width = width as usize;
        Self {
            x: (index % width) as i32,
            y: (index / width) as i32,
        }
    }
}

impl Add for Position {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four cardinal movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards row 0
    Up,
    /// Away from row 0
    Down,
    /// Towards column 0
    Left,
    /// Away from column 0
    Right,
}

impl Direction {
    /// All directions in a fixed order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Returns the (dx, dy) offset of this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Parses a direction name (case-insensitive, single-letter forms allowed).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "up" | "u" | "north" | "n" => Some(Self::Up),
            "down" | "d" | "south" | "s" => Some(Self::Down),
            "left" | "l" | "west" | "w" => Some(Self::Left),
            "right" | "r" | "east" | "e" => Some(Self::Right),
            _ => None,
        }
    }
}
