//! Save/load persistence
//!
//! Features:
//! - Versioned JSON envelope with temp-file writes
//! - Backup rotation (old save -> `.bak`) and fallback on corruption
//! - Profile (currency, upgrades, bests, preferences), mission records and
//!   three action save slots
//!
//! The public `ProgressStore` API never returns an error: failures are logged
//! and callers get defaults ("no saved data").

pub mod envelope;
pub mod profile;
pub mod slots;

pub use profile::{PerkKind, Profile, Purchase, PurchaseCounts};
pub use slots::{SLOT_COUNT, SlotData, SlotId};

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::PersistenceError;
use crate::records::MissionRecords;
use crate::sim::CombatLoop;

const PROFILE_FILE: &str = "game_progress.json";
const RECORDS_FILE: &str = "mission_records.json";

pub struct ProgressStore {
    dir: PathBuf,
}

impl ProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data dir>/shadowsilk`, or the working directory when the platform
    /// has no data directory
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("shadowsilk"))
            .unwrap_or_else(|| PathBuf::from("shadowsilk-data"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, file: &str, what: &str) -> T {
        let path = self.dir.join(file);
        match envelope::read_document(&path) {
            Ok((data, version)) => {
                info!("Loaded {what} (v{version})");
                data
            }
            Err(PersistenceError::Missing(_)) => {
                info!("No {what} found, starting fresh");
                T::default()
            }
            Err(e) => {
                warn!("Failed to load {what} from {}: {e}", path.display());
                T::default()
            }
        }
    }

    fn save(&self, file: &str, what: &str, data: &impl Serialize) -> bool {
        let path = self.dir.join(file);
        match envelope::write_document(&path, data) {
            Ok(()) => {
                info!("Saved {what}");
                true
            }
            Err(e) => {
                warn!("Failed to save {what} to {}: {e}", path.display());
                false
            }
        }
    }

    pub fn load_progress(&self) -> Profile {
        self.load_or_default(PROFILE_FILE, "progress")
    }

    pub fn save_progress(&self, profile: &Profile) -> bool {
        self.save(PROFILE_FILE, "progress", profile)
    }

    pub fn load_records(&self) -> MissionRecords {
        self.load_or_default(RECORDS_FILE, "mission records")
    }

    pub fn save_records(&self, records: &MissionRecords) -> bool {
        self.save(RECORDS_FILE, "mission records", records)
    }

    fn slot_path(&self, slot: u8) -> Result<PathBuf, PersistenceError> {
        Ok(self.dir.join(SlotId::new(slot)?.file_name()))
    }

    /// Write a fresh playthrough for `combat`'s fighter, replacing whatever was there
    pub fn create_slot(&self, slot: u8, combat: &CombatLoop) -> bool {
        self.save_slot(slot, &SlotData::new_game(combat))
    }

    pub fn save_slot(&self, slot: u8, data: &SlotData) -> bool {
        match self.slot_path(slot) {
            Ok(path) => match envelope::write_document(&path, data) {
                Ok(()) => {
                    info!("Game state saved to slot {slot}");
                    true
                }
                Err(e) => {
                    warn!("Failed to save slot {slot}: {e}");
                    false
                }
            },
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }

    pub fn load_slot(&self, slot: u8) -> Option<SlotData> {
        let path = self
            .slot_path(slot)
            .inspect_err(|e| warn!("{e}"))
            .ok()?;
        match envelope::read_document(&path) {
            Ok((data, _)) => {
                info!("Game state loaded from slot {slot}");
                Some(data)
            }
            Err(PersistenceError::Missing(_)) => None,
            Err(e) => {
                warn!("Failed to load slot {slot}: {e}");
                None
            }
        }
    }

    pub fn slot_exists(&self, slot: u8) -> bool {
        self.slot_path(slot).is_ok_and(|p| p.exists())
    }

    /// Remove a slot and its backup. Returns whether anything was deleted.
    pub fn delete_slot(&self, slot: u8) -> bool {
        let Ok(path) = self.slot_path(slot) else {
            warn!("Invalid save slot {slot}");
            return false;
        };
        let mut removed = false;
        for p in [envelope::backup_path(&path), path] {
            if !p.exists() {
                continue;
            }
            match fs::remove_file(&p) {
                Ok(()) => removed = true,
                Err(e) => warn!("Failed to delete {}: {e}", p.display()),
            }
        }
        if removed {
            info!("Deleted slot {slot}");
        }
        removed
    }
}
