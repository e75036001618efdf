//! Save/Load game state.
//!
//! A [`GameSnapshot`] holds the day, the clock, the player and every field
//! cell in the same layout as the older JSON save files, so those files load
//! unchanged. Snapshots are written either as pretty JSON or as a compact
//! binary form: the `MDSV` magic followed by a bincode body.

use meadow_common::{KindId, MagicBytes, Position, SchemaVersion};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::grid::{CellState, CellType, Crop, ForageSpot, Grid};
use crate::inventory::Inventory;

/// File extension for binary saves.
pub const SAVE_EXTENSION: &str = "sav";

/// Errors that can occur during save/load operations.
#[derive(Debug, Error)]
pub enum SaveError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid magic bytes
    #[error("Invalid save file format")]
    InvalidFormat,

    /// Version mismatch
    #[error("Incompatible save version: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build writes
        expected: SchemaVersion,
        /// Version in the file
        found: SchemaVersion,
    },

    /// Save file not found
    #[error("Save not found: {0}")]
    NotFound(String),

    /// Save file corrupted
    #[error("Save file corrupted: {0}")]
    Corrupted(String),

    /// Snapshot does not fit the running game
    #[error("Snapshot rejected: {0}")]
    Rejected(String),
}

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveError>;

/// One cell in its flat, on-disk form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellRecord {
    /// Which of the three states the cell is in
    pub cell_type: CellType,
    /// Plant kind when planted
    pub plant_type: Option<KindId>,
    /// Growth stage when planted
    pub growth_stage: u32,
    /// Watered flag when planted
    pub watered: bool,
    /// Forage kind when holding forage
    pub forage_item: Option<KindId>,
    /// Spawn tick when holding forage
    pub forage_spawn_time: u32,
    /// Stage timer when planted
    pub plant_timer: u32,
}

impl Default for CellRecord {
    fn default() -> Self {
        Self {
            cell_type: CellType::Empty,
            plant_type: None,
            growth_stage: 0,
            watered: false,
            forage_item: None,
            forage_spawn_time: 0,
            plant_timer: 0,
        }
    }
}

impl From<&CellState> for CellRecord {
    fn from(cell: &CellState) -> Self {
        match cell {
            CellState::Empty => Self::default(),
            CellState::Planted(crop) => Self {
                cell_type: CellType::Planted,
                plant_type: Some(crop.kind.clone()),
                growth_stage: crop.growth_stage,
                watered: crop.watered,
                plant_timer: crop.plant_timer,
                ..Self::default()
            },
            CellState::Forage(spot) => Self {
                cell_type: CellType::Forage,
                forage_item: Some(spot.kind.clone()),
                forage_spawn_time: spot.spawn_tick,
                ..Self::default()
            },
        }
    }
}

impl CellRecord {
    /// Rebuild the cell. Fields that do not belong to the cell type are dropped.
    pub fn to_cell(&self) -> SaveResult<CellState> {
        match self.cell_type {
            CellType::Empty => Ok(CellState::Empty),
            CellType::Planted => {
                let kind = self
                    .plant_type
                    .clone()
                    .ok_or_else(|| SaveError::Rejected("planted cell without plant_type".into()))?;
                Ok(CellState::Planted(Crop {
                    kind,
                    growth_stage: self.growth_stage,
                    watered: self.watered,
                    plant_timer: self.plant_timer,
                }))
            },
            CellType::Forage => {
                let kind = self
                    .forage_item
                    .clone()
                    .ok_or_else(|| SaveError::Rejected("forage cell without forage_item".into()))?;
                Ok(CellState::Forage(ForageSpot {
                    kind,
                    spawn_tick: self.forage_spawn_time,
                }))
            },
        }
    }
}

/// Clock and player part of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameStateRecord {
    /// Current day
    pub day: u32,
    /// Minutes into the day
    pub time_minutes: f64,
    /// Player position
    pub player_pos: Position,
    /// Player money
    pub player_money: u64,
    /// Player inventory
    pub inventory: Inventory,
}

impl Default for GameStateRecord {
    fn default() -> Self {
        Self {
            day: 1,
            time_minutes: 0.0,
            player_pos: Position::new(9, 7),
            player_money: 20,
            inventory: Inventory::new(),
        }
    }
}

/// Everything needed to resume a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Schema version of this snapshot
    #[serde(default)]
    pub version: SchemaVersion,
    /// Clock and player
    #[serde(default)]
    pub game_state: GameStateRecord,
    /// Field cells, row by row
    #[serde(default)]
    pub field_state: Vec<Vec<CellRecord>>,
}

impl GameSnapshot {
    /// Builds a snapshot of the given state.
    #[must_use]
    pub fn capture(game_state: GameStateRecord, grid: &Grid) -> Self {
        Self {
            version: SchemaVersion::SAVE_SNAPSHOT,
            game_state,
            field_state: grid
                .rows()
                .map(|row| row.iter().map(CellRecord::from).collect())
                .collect(),
        }
    }

    /// Rebuilds the field, checking it has exactly `width` x `height` cells.
    pub fn build_grid(&self, width: u32, height: u32) -> SaveResult<Grid> {
        if self.field_state.len() != height as usize {
            return Err(SaveError::Rejected(format!(
                "field has {} rows, expected {height}",
                self.field_state.len()
            )));
        }
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for (y, row) in self.field_state.iter().enumerate() {
            if row.len() != width as usize {
                return Err(SaveError::Rejected(format!(
                    "row {y} has {} cells, expected {width}",
                    row.len()
                )));
            }
            for record in row {
                cells.push(record.to_cell()?);
            }
        }
        let mut grid = Grid::new(width, height);
        grid.replace_cells(cells);
        Ok(grid)
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> SaveResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SaveError::Serialization(e.to_string()))
    }

    /// Deserializes from JSON, rejecting newer major versions.
    pub fn from_json(text: &str) -> SaveResult<Self> {
        let snapshot: Self =
            serde_json::from_str(text).map_err(|e| SaveError::Corrupted(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    /// Serializes to binary format.
    pub fn to_bytes(&self) -> SaveResult<Vec<u8>> {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&MagicBytes::SAVE.0);

        let data = bincode::serialize(self).map_err(|e| SaveError::Serialization(e.to_string()))?;
        buffer.extend(data);

        Ok(buffer)
    }

    /// Deserializes from binary format.
    pub fn from_bytes(bytes: &[u8]) -> SaveResult<Self> {
        if !MagicBytes::SAVE.matches(bytes) {
            return Err(SaveError::InvalidFormat);
        }

        let snapshot: Self =
            bincode::deserialize(&bytes[4..]).map_err(|e| SaveError::Corrupted(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    /// Fails if this build cannot read the snapshot's version.
    pub fn check_version(&self) -> SaveResult<()> {
        if SchemaVersion::SAVE_SNAPSHOT.can_read(&self.version) {
            Ok(())
        } else {
            Err(SaveError::VersionMismatch {
                expected: SchemaVersion::SAVE_SNAPSHOT,
                found: self.version,
            })
        }
    }
}

/// Save metadata for listing saves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveMetadata {
    /// Save name
    pub name: String,
    /// Day the game was saved on
    pub day: u32,
    /// Player money at save time
    pub money: u64,
    /// Save file size in bytes
    pub file_size: u64,
}

impl SaveMetadata {
    /// Creates metadata from a snapshot.
    #[must_use]
    pub fn from_snapshot(name: &str, snapshot: &GameSnapshot, file_size: u64) -> Self {
        Self {
            name: name.to_string(),
            day: snapshot.game_state.day,
            money: snapshot.game_state.player_money,
            file_size,
        }
    }
}

/// Save manager for handling save files in one directory.
#[derive(Debug, Clone)]
pub struct SaveManager {
    save_dir: PathBuf,
}

impl SaveManager {
    /// Creates a new save manager with the given save directory.
    #[must_use]
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    /// Gets the save directory path.
    #[must_use]
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Ensures the save directory exists.
    pub fn ensure_dir(&self) -> SaveResult<()> {
        fs::create_dir_all(&self.save_dir)?;
        Ok(())
    }

    fn save_path(&self, name: &str) -> PathBuf {
        self.save_dir.join(format!("{name}.{SAVE_EXTENSION}"))
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.save_dir.join(format!("{name}.{SAVE_EXTENSION}.tmp"))
    }

    /// Writes `bytes` next to the target and renames it into place.
    fn write_atomic(&self, name: &str, bytes: &[u8]) -> SaveResult<()> {
        self.ensure_dir()?;
        let temp_path = self.temp_path(name);

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, self.save_path(name))?;
        Ok(())
    }

    /// Saves a snapshot to disk.
    pub fn save(&self, name: &str, snapshot: &GameSnapshot) -> SaveResult<()> {
        let bytes = snapshot.to_bytes()?;
        self.write_atomic(name, &bytes)?;
        info!("Saved game '{}' (day {})", name, snapshot.game_state.day);
        Ok(())
    }

    /// Loads a snapshot from disk.
    pub fn load(&self, name: &str) -> SaveResult<GameSnapshot> {
        let path = self.save_path(name);
        if !path.exists() {
            return Err(SaveError::NotFound(name.to_string()));
        }
        let bytes = fs::read(&path)?;
        GameSnapshot::from_bytes(&bytes)
    }

    /// Lists all readable saves, sorted by name.
    pub fn list_saves(&self) -> SaveResult<Vec<SaveMetadata>> {
        self.ensure_dir()?;

        let mut saves = Vec::new();
        for entry in fs::read_dir(&self.save_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == SAVE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(snapshot) = self.load(name) {
                let file_size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                saves.push(SaveMetadata::from_snapshot(name, &snapshot, file_size));
            }
        }

        saves.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(saves)
    }

    /// Gets metadata for a specific save.
    pub fn get_metadata(&self, name: &str) -> SaveResult<SaveMetadata> {
        let snapshot = self.load(name)?;
        let file_size = fs::metadata(self.save_path(name)).map(|m| m.len()).unwrap_or(0);
        Ok(SaveMetadata::from_snapshot(name, &snapshot, file_size))
    }

    /// Deletes a save file.
    pub fn delete(&self, name: &str) -> SaveResult<()> {
        let path = self.save_path(name);
        if !path.exists() {
            return Err(SaveError::NotFound(name.to_string()));
        }
        fs::remove_file(&path)?;
        Ok(())
    }

    /// Checks if a save exists.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.save_path(name).exists()
    }

    /// Writes a save out as a JSON file at `path`.
    pub fn export_json(&self, name: &str, path: impl AsRef<Path>) -> SaveResult<()> {
        let snapshot = self.load(name)?;
        fs::write(path, snapshot.to_json()?)?;
        Ok(())
    }

    /// Reads a JSON save file at `path` and stores it under `name`.
    pub fn import_json(&self, name: &str, path: impl AsRef<Path>) -> SaveResult<GameSnapshot> {
        let text = fs::read_to_string(path)?;
        let snapshot = GameSnapshot::from_json(&text)?;
        self.save(name, &snapshot)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meadow_common::ItemId;
    use tempfile::tempdir;

    fn sample_snapshot() -> GameSnapshot {
        let mut grid = Grid::new(3, 2);
        let mut crop = Crop::new(KindId::new("tomato"));
        crop.growth_stage = 2;
        crop.watered = true;
        crop.plant_timer = 17;
        grid.set(Position::new(0, 0), CellState::Planted(crop)).expect("set");
        grid.set(Position::new(2, 1), CellState::forage(KindId::new("herbs"), 44))
            .expect("set");

        let inventory: Inventory = [
            (ItemId::seeds_for("carrot"), 3),
            (ItemId::produce("herbs"), 1),
        ]
        .into_iter()
        .collect();
        GameSnapshot::capture(
            GameStateRecord {
                day: 4,
                time_minutes: 123.5,
                player_pos: Position::new(1, 1),
                player_money: 77,
                inventory,
            },
            &grid,
        )
    }

    #[test]
    fn test_capture_and_rebuild() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.field_state.len(), 2);
        assert_eq!(snapshot.field_state[0].len(), 3);
        assert_eq!(snapshot.field_state[0][0].cell_type, CellType::Planted);

        let grid = snapshot.build_grid(3, 2).expect("grid");
        assert_eq!(GameSnapshot::capture(snapshot.game_state.clone(), &grid), snapshot);
    }

    #[test]
    fn test_build_grid_rejects_wrong_shape() {
        let snapshot = sample_snapshot();
        assert!(matches!(snapshot.build_grid(4, 2), Err(SaveError::Rejected(_))));
        assert!(matches!(snapshot.build_grid(3, 3), Err(SaveError::Rejected(_))));
    }

    #[test]
    fn test_inconsistent_cell_rejected() {
        let record = CellRecord {
            cell_type: CellType::Planted,
            ..CellRecord::default()
        };
        assert!(record.to_cell().is_err());

        // Stale crop fields on an empty cell are discarded.
        let stale = CellRecord {
            plant_type: Some(KindId::new("carrot")),
            growth_stage: 2,
            ..CellRecord::default()
        };
        assert_eq!(stale.to_cell().expect("cell"), CellState::Empty);
    }

    #[test]
    fn test_json_layout() {
        let json = sample_snapshot().to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("value");

        assert_eq!(value["game_state"]["day"], 4);
        assert_eq!(value["game_state"]["player_pos"]["x"], 1);
        assert_eq!(value["game_state"]["inventory"]["carrot_seeds"], 3);
        assert_eq!(value["field_state"][0][0]["cell_type"], "planted");
        assert_eq!(value["field_state"][0][0]["plant_type"], "tomato");
        assert_eq!(value["field_state"][1][2]["forage_item"], "herbs");
        assert_eq!(value["field_state"][1][2]["forage_spawn_time"], 44);
    }

    #[test]
    fn test_legacy_json_loads() {
        let text = r#"{
            "game_state": {
                "day": 2,
                "time_minutes": 300,
                "player_pos": {"x": 3, "y": 4},
                "player_money": 55,
                "inventory": {"carrot": 2, "tomato_seeds": 0}
            },
            "field_state": [[
                {"cell_type": "empty", "plant_type": null, "growth_stage": 0, "watered": false,
                 "forage_item": null, "forage_spawn_time": 0, "plant_timer": 0},
                {"cell_type": "forage", "forage_item": "mushrooms", "forage_spawn_time": 12}
            ]]
        }"#;
        let snapshot = GameSnapshot::from_json(text).expect("legacy");
        assert_eq!(snapshot.version, SchemaVersion::SAVE_SNAPSHOT);
        assert_eq!(snapshot.game_state.day, 2);
        assert_eq!(snapshot.game_state.inventory.len(), 1);
        let grid = snapshot.build_grid(2, 1).expect("grid");
        assert!(grid.can_forage_at(Position::new(1, 0)));
    }

    #[test]
    fn test_binary_roundtrip_and_magic() {
        let snapshot = sample_snapshot();
        let bytes = snapshot.to_bytes().expect("bytes");
        assert_eq!(&bytes[..4], b"MDSV");
        assert_eq!(GameSnapshot::from_bytes(&bytes).expect("decode"), snapshot);

        assert!(matches!(
            GameSnapshot::from_bytes(b"XXXX1234"),
            Err(SaveError::InvalidFormat)
        ));
        assert!(matches!(
            GameSnapshot::from_bytes(&bytes[..bytes.len() / 2]),
            Err(SaveError::Corrupted(_))
        ));
    }

    #[test]
    fn test_newer_major_version_rejected() {
        let mut snapshot = sample_snapshot();
        snapshot.version = SchemaVersion::new(2, 0, 0);
        let bytes = snapshot.to_bytes().expect("bytes");
        assert!(matches!(
            GameSnapshot::from_bytes(&bytes),
            Err(SaveError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_save_manager_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let manager = SaveManager::new(dir.path().join("saves"));
        let snapshot = sample_snapshot();

        assert!(!manager.exists("slot1"));
        manager.save("slot1", &snapshot).expect("save");
        assert!(manager.exists("slot1"));
        assert!(!dir.path().join("saves/slot1.sav.tmp").exists());
        assert_eq!(manager.load("slot1").expect("load"), snapshot);

        let meta = manager.get_metadata("slot1").expect("meta");
        assert_eq!(meta.day, 4);
        assert_eq!(meta.money, 77);
        assert!(meta.file_size > 4);
    }

    #[test]
    fn test_save_manager_listing_and_delete() {
        let dir = tempdir().expect("tempdir");
        let manager = SaveManager::new(dir.path());
        let snapshot = sample_snapshot();
        manager.save("b", &snapshot).expect("save");
        manager.save("a", &snapshot).expect("save");
        fs::write(dir.path().join("junk.sav"), b"not a save").expect("write");

        let names: Vec<String> = manager
            .list_saves()
            .expect("list")
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        manager.delete("a").expect("delete");
        assert!(!manager.exists("a"));
        assert!(matches!(manager.delete("a"), Err(SaveError::NotFound(_))));
        assert!(matches!(manager.load("missing"), Err(SaveError::NotFound(_))));
    }

    #[test]
    fn test_json_export_import() {
        let dir = tempdir().expect("tempdir");
        let manager = SaveManager::new(dir.path());
        let snapshot = sample_snapshot();
        manager.save("main", &snapshot).expect("save");

        let json_path = dir.path().join("main.json");
        manager.export_json("main", &json_path).expect("export");
        let imported = manager.import_json("copy", &json_path).expect("import");
        assert_eq!(imported, snapshot);
        assert_eq!(manager.load("copy").expect("load"), snapshot);
    }
}
