//! Forage spawning and expiry.
//!
//! Once per tick every empty cell rolls for each forage kind in registry order
//! and takes the first kind that hits. Every forage cell whose kind has been
//! lying around for its respawn time is cleared.

use meadow_common::{KindId, Position};
use std::sync::Arc;
use tracing::debug;

use crate::catalog::{Catalog, Rarity};
use crate::grid::{CellState, Grid};

/// Source of uniform random numbers in `[0, 1)`.
///
/// The spawner takes one of these at construction so tests and replays can
/// drive it with a known sequence.
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Bernoulli trial with success probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

impl RandomSource for fastrand::Rng {
    fn next_f64(&mut self) -> f64 {
        self.f64()
    }
}

/// Replays a fixed list of values, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    /// Creates a source that yields `values` in order, then starts over.
    ///
    /// An empty list behaves like a source that always returns `1.0`, which
    /// never passes a trial.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// A source whose trials never succeed.
    #[must_use]
    pub fn never() -> Self {
        Self::new(Vec::new())
    }

    /// A source whose trials always succeed (for any `p > 0`).
    #[must_use]
    pub fn always() -> Self {
        Self::new(vec![0.0])
    }

    /// How many values have been drawn so far.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 1.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

/// What changed on the field during one spawner tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForageUpdate {
    /// Newly spawned forage.
    pub spawned: Vec<(Position, KindId)>,
    /// Cells whose forage expired.
    pub expired: Vec<Position>,
}

impl ForageUpdate {
    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.expired.is_empty()
    }
}

/// Spawns and expires forage items on the grid.
#[derive(Debug, Clone)]
pub struct ForageSpawner<R: RandomSource = fastrand::Rng> {
    catalog: Arc<Catalog>,
    rng: R,
}

impl ForageSpawner<fastrand::Rng> {
    /// Create a spawner with a seeded generator.
    #[must_use]
    pub fn with_seed(catalog: Arc<Catalog>, seed: u64) -> Self {
        Self::new(catalog, fastrand::Rng::with_seed(seed))
    }
}

impl<R: RandomSource> ForageSpawner<R> {
    /// Create a spawner drawing from `rng`.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, rng: R) -> Self {
        Self { catalog, rng }
    }

    /// The random source.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Run one tick of spawning and expiry.
    pub fn update(&mut self, grid: &mut Grid, current_tick: u32) -> ForageUpdate {
        let mut update = ForageUpdate::default();
        let kinds = self.catalog.forage_kinds();

        for (position, cell) in grid.iter_mut() {
            match cell {
                CellState::Empty => {
                    let hit = kinds.iter().find(|kind| self.rng.chance(kind.spawn_chance()));
                    if let Some(kind) = hit {
                        debug!("{} spawned at {} on tick {}", kind.id, position, current_tick);
                        *cell = CellState::forage(kind.id.clone(), current_tick);
                        update.spawned.push((position, kind.id.clone()));
                    }
                },
                CellState::Forage(spot) => {
                    let expired = self
                        .catalog
                        .forage(&spot.kind)
                        .is_some_and(|kind| kind.is_expired(spot.spawn_tick, current_tick));
                    if expired {
                        debug!("{} at {} expired on tick {}", spot.kind, position, current_tick);
                        *cell = CellState::Empty;
                        update.expired.push(position);
                    }
                },
                CellState::Planted(_) => {},
            }
        }

        update
    }

    /// Rarity of the forage at `pos`, if there is registered forage there.
    #[must_use]
    pub fn rarity_at(&self, grid: &Grid, pos: Position) -> Option<Rarity> {
        let spot = grid.get(pos)?.forage_spot()?;
        self.catalog.forage(&spot.kind).map(|kind| kind.rarity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellType, Crop};

    fn spawner(rng: SequenceRandom) -> ForageSpawner<SequenceRandom> {
        ForageSpawner::new(Arc::new(Catalog::default()), rng)
    }

    #[test]
    fn test_never_spawns_with_failing_source() {
        let mut spawner = spawner(SequenceRandom::never());
        let mut grid = Grid::new(4, 4);
        let update = spawner.update(&mut grid, 10);
        assert!(update.is_empty());
        assert_eq!(grid.count_by_type(CellType::Empty), 16);
        // One trial per kind per empty cell.
        assert_eq!(spawner.rng_mut().draws(), 16 * 7);
    }

    #[test]
    fn test_first_matching_kind_wins() {
        // First roll misses wild_berries, second roll hits herbs.
        let mut spawner = spawner(SequenceRandom::new(vec![0.5, 0.0]));
        let mut grid = Grid::new(1, 1);
        let update = spawner.update(&mut grid, 42);

        assert_eq!(update.spawned, vec![(Position::new(0, 0), KindId::new("herbs"))]);
        assert_eq!(
            grid.get(Position::new(0, 0)),
            Some(&CellState::forage(KindId::new("herbs"), 42))
        );
        // Stopped after the hit.
        assert_eq!(spawner.rng_mut().draws(), 2);
    }

    #[test]
    fn test_always_spawns_registry_head() {
        let mut spawner = spawner(SequenceRandom::always());
        let mut grid = Grid::new(3, 2);
        spawner.update(&mut grid, 0);
        assert!(grid
            .iter()
            .all(|(_, cell)| cell.forage_spot().is_some_and(|s| s.kind.as_str() == "wild_berries")));
    }

    #[test]
    fn test_planted_cells_are_left_alone() {
        let mut spawner = spawner(SequenceRandom::always());
        let mut grid = Grid::new(1, 1);
        let pos = Position::new(0, 0);
        grid.set(pos, CellState::Planted(Crop::new(KindId::new("carrot"))))
            .expect("set");
        spawner.update(&mut grid, 5);
        assert_eq!(grid.get(pos).map(CellState::cell_type), Some(CellType::Planted));
    }

    #[test]
    fn test_forage_expiry_boundary() {
        // wild_berries respawn after 60 minutes
        let mut spawner = spawner(SequenceRandom::never());
        let mut grid = Grid::new(1, 1);
        let pos = Position::new(0, 0);
        grid.set(pos, CellState::forage(KindId::new("wild_berries"), 100))
            .expect("set");

        let update = spawner.update(&mut grid, 159);
        assert!(update.expired.is_empty());
        assert!(grid.can_forage_at(pos));

        let update = spawner.update(&mut grid, 160);
        assert_eq!(update.expired, vec![pos]);
        assert_eq!(grid.get(pos), Some(&CellState::Empty));
    }

    #[test]
    fn test_unknown_forage_never_expires() {
        let mut spawner = spawner(SequenceRandom::never());
        let mut grid = Grid::new(1, 1);
        let pos = Position::new(0, 0);
        grid.set(pos, CellState::forage(KindId::new("meteorite"), 0))
            .expect("set");
        spawner.update(&mut grid, 899);
        assert!(grid.can_forage_at(pos));
    }

    #[test]
    fn test_seeded_spawner_is_reproducible() {
        let catalog = Arc::new(Catalog::default());
        let mut a = ForageSpawner::with_seed(Arc::clone(&catalog), 7);
        let mut b = ForageSpawner::with_seed(catalog, 7);
        let mut grid_a = Grid::new(18, 16);
        let mut grid_b = Grid::new(18, 16);

        for tick in 0..500 {
            assert_eq!(a.update(&mut grid_a, tick), b.update(&mut grid_b, tick));
        }
        assert_eq!(grid_a, grid_b);
    }

    #[test]
    fn test_rarity_at() {
        let spawner = spawner(SequenceRandom::never());
        let mut grid = Grid::new(2, 1);
        grid.set(Position::new(0, 0), CellState::forage(KindId::new("crystals"), 0))
            .expect("set");
        assert_eq!(spawner.rarity_at(&grid, Position::new(0, 0)), Some(Rarity::Rare));
        assert_eq!(spawner.rarity_at(&grid, Position::new(1, 0)), None);
    }
}
