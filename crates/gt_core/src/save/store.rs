use super::error::SaveError;
use super::format::{decode, encode, migrate_save, TournamentSave};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, read_dir, rename, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::models::{TournamentKind, TournamentState, TournamentStatus};

/// Per-owner record with one dedicated slot per tournament kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRecord {
    pub owner_id: String,
    pub daily_tournament: Option<TournamentState>,
    pub weekly_tournament: Option<TournamentState>,
    pub league_tournament: Option<TournamentState>,
}

impl OwnerRecord {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self { owner_id: owner_id.into(), ..Self::default() }
    }

    pub fn slot(&self, kind: TournamentKind) -> Option<&TournamentState> {
        match kind {
            TournamentKind::Daily => self.daily_tournament.as_ref(),
            TournamentKind::Weekly => self.weekly_tournament.as_ref(),
            TournamentKind::League => self.league_tournament.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, kind: TournamentKind) -> &mut Option<TournamentState> {
        match kind {
            TournamentKind::Daily => &mut self.daily_tournament,
            TournamentKind::Weekly => &mut self.weekly_tournament,
            TournamentKind::League => &mut self.league_tournament,
        }
    }

    pub fn tournaments(&self) -> impl Iterator<Item = &TournamentState> {
        TournamentKind::ALL.into_iter().filter_map(move |kind| self.slot(kind))
    }
}

/// Persistence collaborator. Whole states in, whole states out.
pub trait TournamentStore: Send + Sync {
    fn load(&self, owner_id: &str, kind: TournamentKind) -> Result<Option<TournamentState>, SaveError>;

    fn save(&self, state: &TournamentState) -> Result<(), SaveError>;

    /// Every tournament currently in `round_in_progress`
    fn in_progress(&self) -> Result<Vec<TournamentState>, SaveError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, OwnerRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, owner_id: &str) -> Result<Option<OwnerRecord>, SaveError> {
        let records = self.records.read().map_err(|_| SaveError::Poisoned)?;
        Ok(records.get(owner_id).cloned())
    }
}

impl TournamentStore for MemoryStore {
    fn load(&self, owner_id: &str, kind: TournamentKind) -> Result<Option<TournamentState>, SaveError> {
        let records = self.records.read().map_err(|_| SaveError::Poisoned)?;
        Ok(records.get(owner_id).and_then(|r| r.slot(kind)).cloned())
    }

    fn save(&self, state: &TournamentState) -> Result<(), SaveError> {
        let mut records = self.records.write().map_err(|_| SaveError::Poisoned)?;
        let record = records
            .entry(state.owner_id.clone())
            .or_insert_with(|| OwnerRecord::new(state.owner_id.clone()));
        *record.slot_mut(state.kind) = Some(state.clone());
        Ok(())
    }

    fn in_progress(&self) -> Result<Vec<TournamentState>, SaveError> {
        let records = self.records.read().map_err(|_| SaveError::Poisoned)?;
        let mut live: Vec<TournamentState> = records
            .values()
            .flat_map(|r| r.tournaments())
            .filter(|s| s.status == TournamentStatus::RoundInProgress)
            .cloned()
            .collect();
        live.sort_by(|a, b| (&a.owner_id, a.kind.slot_key()).cmp(&(&b.owner_id, b.kind.slot_key())));
        Ok(live)
    }
}

/// `<root>/<owner>/<slot_key>.dat`, one compressed save per slot
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn owner_dir(&self, owner_id: &str) -> PathBuf {
        let safe: String = owner_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(safe)
    }

    fn slot_path(&self, owner_id: &str, kind: TournamentKind) -> PathBuf {
        self.owner_dir(owner_id).join(format!("{}.dat", kind.slot_key()))
    }

    fn save_to_path(path: &Path, save: &TournamentSave) -> Result<(), SaveError> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let data = encode(save)?;

        // Atomic save: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.flush()?;
            file.sync_all()?;
        }
        rename(&temp_path, path)?;

        log::debug!("Saved {} bytes to {:?}", data.len(), path);
        Ok(())
    }

    fn load_from_path(path: &Path) -> Result<TournamentSave, SaveError> {
        if !path.exists() {
            return Err(SaveError::FileNotFound { path: path.display().to_string() });
        }

        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let save = migrate_save(decode(&data)?)?;
        log::debug!("Loaded {} bytes from {:?}", data.len(), path);
        Ok(save)
    }
}

impl TournamentStore for FileStore {
    fn load(&self, owner_id: &str, kind: TournamentKind) -> Result<Option<TournamentState>, SaveError> {
        let path = self.slot_path(owner_id, kind);
        match Self::load_from_path(&path) {
            Ok(save) if save.owner_id == owner_id && save.kind == kind => Ok(Some(save.state)),
            Ok(_) => Err(SaveError::SlotMismatch { owner: owner_id.to_string(), kind }),
            Err(SaveError::FileNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, state: &TournamentState) -> Result<(), SaveError> {
        let path = self.slot_path(&state.owner_id, state.kind);
        Self::save_to_path(&path, &TournamentSave::new(state.clone()))?;
        log::info!("Tournament {} saved for {} ({})", state.id, state.owner_id, state.kind.slot_key());
        Ok(())
    }

    fn in_progress(&self) -> Result<Vec<TournamentState>, SaveError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut live = Vec::new();
        for entry in read_dir(&self.root)? {
            let dir = entry?.path();
            if !dir.is_dir() {
                continue;
            }
            for kind in TournamentKind::ALL {
                let path = dir.join(format!("{}.dat", kind.slot_key()));
                if !path.exists() {
                    continue;
                }
                match Self::load_from_path(&path) {
                    Ok(save) if save.state.status == TournamentStatus::RoundInProgress => live.push(save.state),
                    Ok(_) => {}
                    Err(e) => log::warn!("Skipping unreadable save {:?}: {}", path, e),
                }
            }
        }
        live.sort_by(|a, b| (&a.owner_id, a.kind.slot_key()).cmp(&(&b.owner_id, b.kind.slot_key())));
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::build_tournament;
    use crate::test_support::field;
    use tempfile::TempDir;

    fn league(owner: &str) -> TournamentState {
        let mut competitors = field(6, 60);
        competitors[0].id = owner.to_string();
        build_tournament(TournamentKind::League, owner, competitors).unwrap()
    }

    #[test]
    fn test_owner_record_slots() {
        let mut record = OwnerRecord::new("me");
        assert!(record.slot(TournamentKind::League).is_none());
        *record.slot_mut(TournamentKind::League) = Some(league("me"));
        assert!(record.slot(TournamentKind::League).is_some());
        assert!(record.slot(TournamentKind::Daily).is_none());
        assert_eq!(record.tournaments().count(), 1);
    }

    #[test]
    fn test_memory_store_in_progress() {
        let store = MemoryStore::new();
        let mut a = league("a");
        let b = league("b");
        a.status = TournamentStatus::RoundInProgress;
        store.save(&a).unwrap();
        store.save(&b).unwrap();

        let live = store.in_progress().unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].owner_id, "a");
        assert_eq!(store.load("b", TournamentKind::League).unwrap(), Some(b));
        assert!(store.load("b", TournamentKind::Daily).unwrap().is_none());
        assert!(store.record("a").unwrap().is_some());
    }

    #[test]
    fn test_file_store_roundtrip_and_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        let state = league("user/1");
        store.save(&state).unwrap();

        let loaded = store.load("user/1", TournamentKind::League).unwrap();
        assert_eq!(loaded, Some(state));
        assert!(store.load("user/1", TournamentKind::Weekly).unwrap().is_none());

        let path = store.slot_path("user/1", TournamentKind::League);
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_file_store_lists_live_tournaments() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        let mut live = league("x");
        live.status = TournamentStatus::RoundInProgress;
        store.save(&live).unwrap();
        store.save(&league("y")).unwrap();

        // Garbage next to the real saves is skipped
        std::fs::write(temp_dir.path().join("x").join("weekly_tournament.dat"), b"garbage").unwrap();

        let found = store.in_progress().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].owner_id, "x");
    }
}
