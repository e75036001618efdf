//! Application loop.
//!
//! Reads commands, applies them to the simulation and prints what happened.
//! Shop and shipping actions only work while standing on their tiles.

use anyhow::{Context, Result};
use meadow_common::{ItemId, KindId, Position};
use meadow_gameplay::{
    Catalog, CellState, InteractionError, InteractionResult, RandomSource, SaveManager,
    Simulation,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{debug, info};

use crate::command::{parse_command, Command, HELP, MAX_WAIT_SECONDS};
use crate::config::EngineConfig;

/// Output of one command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Response {
    /// Lines to show the player
    pub lines: Vec<String>,
    /// Whether the session should end
    pub quit: bool,
}

impl Response {
    fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            quit: false,
        }
    }
}

/// The farm session.
#[derive(Debug)]
pub struct App<R: RandomSource = fastrand::Rng> {
    config: EngineConfig,
    sim: Simulation<R>,
    saves: SaveManager,
    selected: Option<ItemId>,
    for_sale: Vec<KindId>,
}

impl App<fastrand::Rng> {
    /// Start a new game from `config`, loading the catalog it names.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load_from(path)
                .with_context(|| format!("loading catalog {}", path.display()))?,
            None => Catalog::default(),
        };
        let sim = Simulation::new(config.simulation.clone(), Arc::new(catalog));
        Ok(Self::with_simulation(config, sim))
    }
}

impl<R: RandomSource> App<R> {
    /// Wrap an existing simulation.
    pub fn with_simulation(config: EngineConfig, sim: Simulation<R>) -> Self {
        let saves = SaveManager::new(config.save_dir.clone());
        let for_sale = config.plants_for_sale(sim.clock().day());
        let selected = sim.player().seed_items().next().cloned();
        Self {
            config,
            sim,
            saves,
            selected,
            for_sale,
        }
    }

    /// The running simulation.
    pub fn simulation(&self) -> &Simulation<R> {
        &self.sim
    }

    fn here(&self) -> Position {
        self.sim.player().position()
    }

    fn name_of(&self, item: &ItemId) -> String {
        self.sim.catalog().item_name(item)
    }

    /// Apply one command.
    pub fn execute(&mut self, command: Command) -> Response {
        debug!("Executing {:?}", command);
        match command {
            Command::Move(direction) => {
                if self.sim.move_player(direction) {
                    Response::default()
                } else {
                    Response::line("You can't go that way.")
                }
            },
            Command::Select(item) => self.select(item),
            Command::Cycle => self.cycle(),
            Command::Plant(kind) => self.plant(kind),
            Command::Water => {
                let result = self.sim.water_plant(self.here());
                Response::line(match result {
                    Ok(()) => "Plant watered!".to_string(),
                    Err(_) => "Nothing to water here!".to_string(),
                })
            },
            Command::Harvest => {
                let result = self.sim.harvest_plant(self.here());
                Response::line(match result {
                    Ok(()) => "Harvested!".to_string(),
                    Err(InteractionError::NotReady) => "Plant not ready!".to_string(),
                    Err(InteractionError::Failed { reason }) => format!("Harvest failed: {reason}"),
                    Err(_) => "Nothing to harvest!".to_string(),
                })
            },
            Command::Forage => {
                let here = self.here();
                let rarity = self.sim.forage_rarity(here);
                let result = self.sim.forage_item(here);
                Response::line(match (result, rarity) {
                    (Ok(()), Some(rarity)) => format!("Foraged a {} item!", rarity.display_name()),
                    (Ok(()), None) => "Foraged item!".to_string(),
                    (Err(InteractionError::Failed { reason }), _) => {
                        format!("Forage failed: {reason}")
                    },
                    (Err(_), _) => "Nothing to forage!".to_string(),
                })
            },
            Command::Buy { kind, quantity } => self.buy(kind, quantity),
            Command::Ship => self.ship(),
            Command::Wait { seconds } => self.wait(seconds),
            Command::Status => Response {
                lines: self.status_lines(),
                quit: false,
            },
            Command::Map => Response {
                lines: self.map_lines(),
                quit: false,
            },
            Command::Save => self.save(),
            Command::Load => self.load(),
            Command::Help => Response {
                lines: HELP.iter().map(ToString::to_string).collect(),
                quit: false,
            },
            Command::Quit => {
                let mut response = if self.config.auto_save_on_quit {
                    self.save()
                } else {
                    Response::default()
                };
                response.lines.push("Goodbye!".to_string());
                response.quit = true;
                response
            },
        }
    }

    fn select(&mut self, item: ItemId) -> Response {
        if self.sim.player().inventory().count(&item) == 0 {
            return Response::line(format!("You have no {}.", self.name_of(&item)));
        }
        let line = format!("Selected {}.", self.name_of(&item));
        self.selected = Some(item);
        Response::line(line)
    }

    fn cycle(&mut self) -> Response {
        let seeds: Vec<ItemId> = self.sim.player().seed_items().cloned().collect();
        if seeds.is_empty() {
            self.selected = None;
            return Response::line("You have no seeds.");
        }
        let next = self
            .selected
            .as_ref()
            .and_then(|current| seeds.iter().position(|s| s == current))
            .map_or(0, |i| (i + 1) % seeds.len());
        self.select(seeds[next].clone())
    }

    fn plant(&mut self, kind: Option<KindId>) -> Response {
        let kind = match kind {
            Some(kind) => kind,
            None => match self.selected.as_ref().and_then(ItemId::seed_of) {
                Some(kind) => kind.clone(),
                None => return Response::line("Select seeds first!"),
            },
        };

        let result = self.sim.plant_seed(self.here(), &kind);
        let seed = ItemId::seeds_for(kind.clone());
        let line = match result {
            Ok(()) => format!("Planted {}!", self.name_of(&ItemId::produce(kind))),
            Err(InteractionError::NoSeeds) => format!("No {}!", self.name_of(&seed)),
            Err(InteractionError::NoMoney) => "Not enough money!".to_string(),
            Err(InteractionError::AlreadyPlanted) => "Already planted here!".to_string(),
            Err(err) => format!("Can't plant here: {err}"),
        };
        if self.sim.player().inventory().count(&seed) == 0 && self.selected.as_ref() == Some(&seed)
        {
            self.selected = self.sim.player().seed_items().next().cloned();
        }
        Response::line(line)
    }

    fn buy(&mut self, kind: Option<KindId>, quantity: u32) -> Response {
        if self.here() != self.config.shop_tile {
            return Response::line("No seed shop here!");
        }
        let kind = kind
            .or_else(|| {
                self.selected
                    .as_ref()
                    .and_then(ItemId::seed_of)
                    .filter(|k| self.for_sale.contains(k))
                    .cloned()
            })
            .or_else(|| self.for_sale.first().cloned());
        let Some(kind) = kind else {
            return Response::line("The shop has nothing for sale.");
        };
        if !self.for_sale.contains(&kind) {
            return Response::line(format!("{kind} seeds are not sold yet."));
        }

        let result: InteractionResult<()> = self.sim.buy_seeds(&kind, quantity);
        let seed = ItemId::seeds_for(kind.clone());
        Response::line(match result {
            Ok(()) => {
                if self.selected.is_none() {
                    self.selected = Some(seed.clone());
                }
                format!("Bought {} {}!", quantity, self.name_of(&seed))
            },
            Err(InteractionError::NoMoney) => {
                let cost = self
                    .sim
                    .catalog()
                    .plant(&kind)
                    .map_or(0, |p| p.seed_cost.saturating_mul(u64::from(quantity)));
                format!("Need ${cost} for {}!", self.name_of(&seed))
            },
            Err(_) => "Can't buy seeds!".to_string(),
        })
    }

    fn ship(&mut self) -> Response {
        if self.here() != self.config.shipping_tile {
            return Response::line("No shipping container here!");
        }
        match self.sim.ship_items() {
            0 => Response::line("Nothing to ship!"),
            earnings => Response::line(format!("Shipped items for ${earnings}!")),
        }
    }

    /// Let time pass one game minute at a time so every tick is processed.
    fn wait(&mut self, seconds: f64) -> Response {
        let step = 1.0 / self.sim.clock().minutes_per_second();
        let mut remaining = seconds.min(MAX_WAIT_SECONDS);
        let mut response = Response::default();

        while remaining > 0.0 {
            let dt = remaining.min(step);
            remaining -= dt;
            let report = self.sim.advance(dt);
            if let Some(day) = report.day {
                response.lines.push(format!(
                    "Day {} complete! Earned ${} from shipping.",
                    day.completed_day, day.earnings
                ));
                if day.won {
                    response.lines.push(format!(
                        "Congratulations! You've grown a {} and won the game!",
                        self.name_of(&ItemId::produce(self.sim.config().ultimate_plant.clone()))
                    ));
                }
                response.lines.extend(self.refresh_unlocks());
            }
        }
        response.lines.push(self.sim.time_string());
        response
    }

    /// Put newly unlocked seeds on sale.
    fn refresh_unlocks(&mut self) -> Vec<String> {
        let today = self.config.plants_for_sale(self.sim.clock().day());
        let mut lines = Vec::new();
        for kind in &today {
            if !self.for_sale.contains(kind) {
                let seed = ItemId::seeds_for(kind.clone());
                info!("Unlocked {} on day {}", kind, self.sim.clock().day());
                lines.push(format!("{} unlocked!", self.name_of(&seed)));
            }
        }
        self.for_sale = today;
        lines
    }

    fn save(&mut self) -> Response {
        let name = self.config.save_name.clone();
        if self.sim.save_game(&self.saves, &name) {
            Response::line(format!("Game saved to {name}"))
        } else {
            Response::line("Failed to save game")
        }
    }

    fn load(&mut self) -> Response {
        let name = self.config.save_name.clone();
        if !self.sim.load_game(&self.saves, &name) {
            return Response::line("Failed to load game");
        }
        self.for_sale = self.config.plants_for_sale(self.sim.clock().day());
        if !self
            .selected
            .as_ref()
            .is_some_and(|item| self.sim.player().inventory().count(item) > 0)
        {
            self.selected = self.sim.player().seed_items().next().cloned();
        }
        Response::line(format!("Game loaded from {name}"))
    }

    fn status_lines(&self) -> Vec<String> {
        let player = self.sim.player();
        let here = self.here();
        let mut lines = vec![
            self.sim.time_string(),
            format!("Money: ${}", player.money()),
            format!("Position: {here}"),
        ];

        if player.inventory().is_empty() {
            lines.push("Inventory: empty".to_string());
        } else {
            lines.push("Inventory:".to_string());
            for (item, count) in player.inventory().iter() {
                let marker = if self.selected.as_ref() == Some(item) { ">" } else { " " };
                lines.push(format!("{marker} {} x{count}", self.name_of(item)));
            }
        }

        let under_foot = match self.sim.grid().get(here) {
            Some(CellState::Planted(crop)) => {
                let progress = self.sim.growth_progress(here).unwrap_or(0.0);
                format!(
                    "Here: {} ({:.0}% grown{})",
                    self.name_of(&ItemId::produce(crop.kind.clone())),
                    progress * 100.0,
                    if crop.watered { ", watered" } else { "" }
                )
            },
            Some(CellState::Forage(spot)) => {
                let rarity = self
                    .sim
                    .forage_rarity(here)
                    .map_or("unknown", |r| r.display_name());
                format!(
                    "Here: {} ({rarity})",
                    self.name_of(&ItemId::produce(spot.kind.clone()))
                )
            },
            _ if here == self.config.shop_tile => {
                let names: Vec<String> = self
                    .for_sale
                    .iter()
                    .filter_map(|k| self.sim.catalog().plant(k))
                    .map(|p| format!("{} ${}", p.name, p.seed_cost))
                    .collect();
                format!("Here: seed shop ({})", names.join(", "))
            },
            _ if here == self.config.shipping_tile => "Here: shipping bin".to_string(),
            _ => "Here: empty soil".to_string(),
        };
        lines.push(under_foot);
        lines
    }

    /// One text row per field row: `@` player, `$` shop, `B` bin,
    /// `*` forage, digits for crop stages, `.` empty.
    fn map_lines(&self) -> Vec<String> {
        let grid = self.sim.grid();
        grid.rows()
            .enumerate()
            .map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(|(x, cell)| {
                        let pos = Position::new(x as i32, y as i32);
                        if pos == self.here() {
                            '@'
                        } else if pos == self.config.shop_tile {
                            '$'
                        } else if pos == self.config.shipping_tile {
                            'B'
                        } else {
                            match cell {
                                CellState::Empty => '.',
                                CellState::Forage(_) => '*',
                                CellState::Planted(crop) => {
                                    char::from_digit(crop.growth_stage.min(9), 10).unwrap_or('#')
                                },
                            }
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// Run commands from `script`, or from stdin when there is none.
pub fn run(config: EngineConfig, script: Option<Vec<Command>>) -> Result<()> {
    let mut app = App::new(config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "Welcome to the farm! Type `help` for commands.")?;
    writeln!(out, "{}", app.simulation().time_string())?;

    if let Some(commands) = script {
        for command in commands {
            let response = app.execute(command);
            print_response(&mut out, &response)?;
            if response.quit {
                break;
            }
        }
        return Ok(());
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(command) => {
                let response = app.execute(command);
                print_response(&mut out, &response)?;
                if response.quit {
                    break;
                }
            },
            Err(e) => writeln!(out, "{e}")?,
        }
    }
    Ok(())
}

fn print_response(out: &mut impl Write, response: &Response) -> io::Result<()> {
    for line in &response.lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}
