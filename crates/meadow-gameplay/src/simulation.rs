//! Day and tick orchestration.
//!
//! [`Simulation`] owns the field, the player and the clock. The caller feeds
//! it real-time deltas through [`Simulation::advance`]; growth and forage run
//! once per whole game minute no matter how often `advance` is called, and
//! crossing the end of a day ships the player's goods.

use meadow_common::{Direction, KindId, Position};
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::{Catalog, Rarity};
use crate::config::SimulationConfig;
use crate::forage::{ForageSpawner, ForageUpdate, RandomSource};
use crate::grid::Grid;
use crate::interaction::{InteractionManager, InteractionResult};
use crate::plants::{PlantGrowth, StageAdvance};
use crate::player::Player;
use crate::save::{GameSnapshot, GameStateRecord, SaveError, SaveManager, SaveResult};
use crate::time::GameClock;

/// Settlement of a finished day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayReport {
    /// The day that just ended
    pub completed_day: u32,
    /// Money made from shipping
    pub earnings: u64,
    /// Whether the ultimate plant stands ripe on the field
    pub won: bool,
}

/// What one call to [`Simulation::advance`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Tick processed during this step, if a minute boundary was crossed
    pub tick: Option<u32>,
    /// Crops that entered a new stage
    pub advances: Vec<StageAdvance>,
    /// Forage spawned and expired
    pub forage: ForageUpdate,
    /// Present when the day ended during this step
    pub day: Option<DayReport>,
}

/// The running game.
#[derive(Debug)]
pub struct Simulation<R: RandomSource = fastrand::Rng> {
    config: SimulationConfig,
    catalog: Arc<Catalog>,
    grid: Grid,
    player: Player,
    clock: GameClock,
    last_tick: u32,
    growth: PlantGrowth,
    spawner: ForageSpawner<R>,
    interactions: InteractionManager,
    has_won: bool,
}

impl Simulation<fastrand::Rng> {
    /// Start a new game. Forage uses the configured seed, or a random one.
    #[must_use]
    pub fn new(config: SimulationConfig, catalog: Arc<Catalog>) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self::with_rng(config, catalog, rng)
    }
}

impl<R: RandomSource> Simulation<R> {
    /// Start a new game drawing forage rolls from `rng`.
    #[must_use]
    pub fn with_rng(mut config: SimulationConfig, catalog: Arc<Catalog>, rng: R) -> Self {
        config.validate();
        let grid = Grid::new(config.field_width, config.field_height);
        let player = Player::new(
            config.start_position,
            config.starting_money,
            config.starting_inventory(),
        );
        let clock = GameClock::new(config.day_length, config.minutes_per_second);

        Self {
            grid,
            player,
            clock,
            last_tick: 0,
            growth: PlantGrowth::new(Arc::clone(&catalog)),
            spawner: ForageSpawner::new(Arc::clone(&catalog), rng),
            interactions: InteractionManager::new(Arc::clone(&catalog)),
            has_won: false,
            catalog,
            config,
        }
    }

    /// The settings this game runs with.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The plant and forage registries.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The field.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The player.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// The clock.
    #[must_use]
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Last tick that ran growth and forage.
    #[must_use]
    pub fn last_tick(&self) -> u32 {
        self.last_tick
    }

    /// Whether the ultimate plant has ever been seen ripe at a day's end.
    #[must_use]
    pub fn has_won(&self) -> bool {
        self.has_won
    }

    /// `Day D - HH:MM`
    #[must_use]
    pub fn time_string(&self) -> String {
        self.clock.time_string()
    }

    /// The forage random source.
    pub fn rng_mut(&mut self) -> &mut R {
        self.spawner.rng_mut()
    }

    /// Jump the clock. The current tick counts as already processed.
    pub fn set_time(&mut self, day: u32, time_minutes: f64) {
        self.clock.set(day, time_minutes);
        self.last_tick = self.clock.current_tick();
    }

    /// Move time forward by `seconds` of real time.
    pub fn advance(&mut self, seconds: f64) -> StepReport {
        let mut report = StepReport::default();

        if self.clock.advance(seconds) {
            report.day = Some(self.end_day());
        }

        let tick = self.clock.current_tick();
        if tick != self.last_tick {
            report.advances = self.growth.update(&mut self.grid);
            report.forage = self.spawner.update(&mut self.grid, tick);
            self.last_tick = tick;
            report.tick = Some(tick);
        }

        report
    }

    fn end_day(&mut self) -> DayReport {
        let completed_day = self.clock.day().saturating_sub(1);
        let earnings = self.interactions.ship_items(&mut self.player);
        info!("Day {} complete, earned ${}", completed_day, earnings);

        let won = self.growth.has_mature(&self.grid, &self.config.ultimate_plant);
        if won && !self.has_won {
            info!(
                "{} is ripe on day {}: the farm is complete",
                self.config.ultimate_plant, completed_day
            );
        }
        self.has_won |= won;

        DayReport {
            completed_day,
            earnings,
            won,
        }
    }

    /// Step the player one cell. Returns `false` at the field's edge.
    pub fn move_player(&mut self, direction: Direction) -> bool {
        self.player.try_move(direction, &self.grid)
    }

    /// Plant a seed of `kind` at `pos`.
    pub fn plant_seed(&mut self, pos: Position, kind: &KindId) -> InteractionResult<()> {
        self.interactions
            .plant_seed(&mut self.grid, &mut self.player, pos, kind)
    }

    /// Water the crop at `pos`.
    pub fn water_plant(&mut self, pos: Position) -> InteractionResult<()> {
        self.interactions.water_plant(&mut self.grid, pos)
    }

    /// Harvest the crop at `pos`.
    pub fn harvest_plant(&mut self, pos: Position) -> InteractionResult<()> {
        self.interactions
            .harvest_plant(&mut self.grid, &mut self.player, pos)
    }

    /// Pick up forage at `pos`.
    pub fn forage_item(&mut self, pos: Position) -> InteractionResult<()> {
        self.interactions
            .forage_item(&mut self.grid, &mut self.player, pos)
    }

    /// Buy seeds.
    pub fn buy_seeds(&mut self, kind: &KindId, quantity: u32) -> InteractionResult<()> {
        self.interactions.buy_seeds(&mut self.player, kind, quantity)
    }

    /// Ship everything sellable right now.
    pub fn ship_items(&mut self) -> u64 {
        self.interactions.ship_items(&mut self.player)
    }

    /// Growth progress of the crop at `pos`.
    #[must_use]
    pub fn growth_progress(&self, pos: Position) -> Option<f32> {
        self.growth.growth_progress(&self.grid, pos)
    }

    /// Rarity of the forage at `pos`.
    #[must_use]
    pub fn forage_rarity(&self, pos: Position) -> Option<Rarity> {
        self.spawner.rarity_at(&self.grid, pos)
    }

    /// Capture the full game state.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::capture(
            GameStateRecord {
                day: self.clock.day(),
                time_minutes: self.clock.time_minutes(),
                player_pos: self.player.position(),
                player_money: self.player.money(),
                inventory: self.player.inventory().clone(),
            },
            &self.grid,
        )
    }

    /// Replace the game state with `snapshot`.
    ///
    /// Everything is checked before anything is replaced, so a rejected
    /// snapshot leaves the running game untouched.
    pub fn restore(&mut self, snapshot: &GameSnapshot) -> SaveResult<()> {
        snapshot.check_version()?;
        let state = &snapshot.game_state;

        let grid = snapshot.build_grid(self.grid.width(), self.grid.height())?;
        if !grid.is_valid_position(state.player_pos) {
            return Err(SaveError::Rejected(format!(
                "player position {} is off the field",
                state.player_pos
            )));
        }
        if state.day == 0 {
            return Err(SaveError::Rejected("day must be at least 1".into()));
        }
        let day_length = f64::from(self.clock.day_length());
        if !(state.time_minutes.is_finite()
            && state.time_minutes >= 0.0
            && state.time_minutes < day_length)
        {
            return Err(SaveError::Rejected(format!(
                "time {} is outside the day",
                state.time_minutes
            )));
        }

        self.grid = grid;
        self.player = Player::new(
            state.player_pos,
            state.player_money,
            state.inventory.clone(),
        );
        self.set_time(state.day, state.time_minutes);
        self.has_won = false;
        Ok(())
    }

    /// Save under `name`. Failures are logged and reported as `false`.
    pub fn save_game(&self, saves: &SaveManager, name: &str) -> bool {
        match saves.save(name, &self.snapshot()) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save '{}': {}", name, e);
                false
            },
        }
    }

    /// Load the save `name`. On failure the running game is left as it was.
    pub fn load_game(&mut self, saves: &SaveManager, name: &str) -> bool {
        let result = saves.load(name).and_then(|snapshot| self.restore(&snapshot));
        match result {
            Ok(()) => {
                info!("Loaded game '{}' ({})", name, self.time_string());
                true
            },
            Err(e) => {
                warn!("Failed to load '{}': {}", name, e);
                false
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forage::SequenceRandom;
    use crate::grid::{CellState, Crop};
    use meadow_common::ItemId;
    use tempfile::tempdir;

    fn quiet_sim() -> Simulation<SequenceRandom> {
        Simulation::with_rng(
            SimulationConfig::default(),
            Arc::new(Catalog::default()),
            SequenceRandom::never(),
        )
    }

    #[test]
    fn test_new_game_state() {
        let sim = quiet_sim();
        assert_eq!(sim.clock().day(), 1);
        assert_eq!(sim.player().position(), Position::new(9, 7));
        assert_eq!(sim.player().money(), 20);
        assert_eq!(sim.grid().width(), 18);
        assert_eq!(sim.time_string(), "Day 1 - 00:00");
    }

    #[test]
    fn test_tick_runs_once_per_minute() {
        let mut sim = quiet_sim();

        assert_eq!(sim.advance(0.4).tick, None);
        assert_eq!(sim.advance(0.4).tick, None);
        assert_eq!(sim.advance(0.4).tick, Some(1));
        assert_eq!(sim.advance(0.1).tick, None);
        // One spawner pass over 18x16 cells with 7 kinds.
        assert_eq!(sim.rng_mut().draws(), 18 * 16 * 7);
    }

    #[test]
    fn test_large_step_runs_single_tick() {
        let mut sim = quiet_sim();
        let pos = Position::new(0, 0);
        let mut crop = Crop::new(KindId::new("carrot"));
        crop.watered = true;
        sim.grid_mut().set(pos, CellState::Planted(crop)).expect("set");

        let report = sim.advance(120.0);
        assert_eq!(report.tick, Some(120));
        let crop = sim.grid().get(pos).and_then(CellState::crop).expect("crop");
        assert_eq!(crop.plant_timer, 1);
    }

    #[test]
    fn test_day_end_ships_and_reports() {
        let mut sim = quiet_sim();
        sim.player_mut()
            .inventory_mut()
            .add(ItemId::produce("tomato"), 2)
            .expect("add");
        sim.set_time(1, 899.5);

        let report = sim.advance(1.0);
        let day = report.day.expect("day report");
        assert_eq!(day.completed_day, 1);
        assert_eq!(day.earnings, 100);
        assert!(!day.won);
        assert_eq!(sim.clock().day(), 2);
        assert_eq!(sim.player().money(), 120);
        assert_eq!(report.tick, Some(0));
    }

    #[test]
    fn test_win_reported_at_day_end() {
        let mut sim = quiet_sim();
        let mut pumpkin = Crop::new(KindId::new("gigantic_pumpkin"));
        pumpkin.growth_stage = 6;
        sim.grid_mut()
            .set(Position::new(3, 3), CellState::Planted(pumpkin))
            .expect("set");
        assert!(!sim.has_won());

        sim.set_time(5, 899.0);
        let day = sim.advance(2.0).day.expect("day report");
        assert!(day.won);
        assert!(sim.has_won());
        // The game keeps going.
        assert!(sim.advance(1.0).tick.is_some());
    }

    #[test]
    fn test_restore_rejects_and_keeps_state() {
        let mut sim = quiet_sim();
        sim.plant_seed(Position::new(1, 1), &KindId::new("carrot"))
            .expect("plant");
        let before = sim.snapshot();

        let mut wrong_size = before.clone();
        wrong_size.field_state.pop();
        assert!(sim.restore(&wrong_size).is_err());

        let mut off_field = before.clone();
        off_field.game_state.player_pos = Position::new(30, 0);
        assert!(sim.restore(&off_field).is_err());

        let mut bad_time = before.clone();
        bad_time.game_state.time_minutes = 900.0;
        assert!(sim.restore(&bad_time).is_err());

        assert_eq!(sim.snapshot(), before);
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let mut sim = quiet_sim();
        sim.plant_seed(Position::new(2, 2), &KindId::new("tomato"))
            .expect("plant");
        sim.water_plant(Position::new(2, 2)).expect("water");
        sim.move_player(Direction::Left);
        sim.advance(42.0);
        let saved = sim.snapshot();

        let mut other = quiet_sim();
        other.restore(&saved).expect("restore");
        assert_eq!(other.snapshot(), saved);
        assert_eq!(other.last_tick(), 42);
    }

    #[test]
    fn test_save_and_load_game() {
        let dir = tempdir().expect("tempdir");
        let saves = SaveManager::new(dir.path());
        let mut sim = quiet_sim();
        sim.buy_seeds(&KindId::new("carrot"), 2).expect("buy");
        assert!(sim.save_game(&saves, "slot"));

        let mut other = quiet_sim();
        assert!(other.load_game(&saves, "slot"));
        assert_eq!(other.player(), sim.player());

        let before = other.snapshot();
        assert!(!other.load_game(&saves, "missing"));
        assert_eq!(other.snapshot(), before);
    }

    #[test]
    fn test_seeded_games_match() {
        let config = SimulationConfig {
            rng_seed: Some(11),
            ..SimulationConfig::default()
        };
        let catalog = Arc::new(Catalog::default());
        let mut a = Simulation::new(config.clone(), Arc::clone(&catalog));
        let mut b = Simulation::new(config, catalog);
        for _ in 0..600 {
            a.advance(1.0);
            b.advance(1.0);
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }
}
