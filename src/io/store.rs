//! Persistence of the whole [`AppState`] as one JSON blob.

use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, atomic_write, log_recovery};
use crate::model::state::AppState;

const STATE_FILE: &str = "state.json";
const BACKUP_FILE: &str = "state.json.bak";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },
    #[error("could not serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Opaque load/save of the full state.
///
/// `load` returns `Ok(None)` when nothing was ever saved.
pub trait StateStore {
    fn load(&mut self) -> Result<Option<AppState>, StoreError>;
    fn save(&mut self, state: &AppState) -> Result<(), StoreError>;
}

/// `state.json` inside a data directory.
///
/// Write failures are recorded in the recovery log with the unsaved blob. A
/// blob that cannot be decoded is copied to `state.json.bak` and logged before
/// `StoreError::Parse` is returned.
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        JsonFileStore {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    fn back_up_unreadable(&self, raw: &[u8], err: &serde_json::Error) {
        let backup = self.data_dir.join(BACKUP_FILE);
        if let Err(e) = fs::write(&backup, raw) {
            eprintln!("warning: could not back up {}: {}", STATE_FILE, e);
        }
        log_recovery(
            &self.data_dir,
            RecoveryEntry::new(RecoveryCategory::Parser, format!("{} unreadable", STATE_FILE))
                .field("Error", err.to_string())
                .field("Backup", backup.display().to_string())
                .body(String::from_utf8_lossy(raw)),
        );
        eprintln!(
            "warning: {} could not be parsed ({}); a copy was saved to {}",
            STATE_FILE,
            err,
            backup.display()
        );
    }
}

impl StateStore for JsonFileStore {
    fn load(&mut self) -> Result<Option<AppState>, StoreError> {
        let path = self.state_path();
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        // Invalid UTF-8 is a decode error too, so it gets the same backup
        serde_json::from_slice(&raw).map(Some).map_err(|source| {
            self.back_up_unreadable(&raw, &source);
            StoreError::Parse {
                origin: path.display().to_string(),
                source,
            }
        })
    }

    fn save(&mut self, state: &AppState) -> Result<(), StoreError> {
        let blob = serde_json::to_string_pretty(state)?;
        let path = self.state_path();
        let written = fs::create_dir_all(&self.data_dir)
            .and_then(|()| atomic_write(&path, blob.as_bytes()));
        if let Err(source) = written {
            log_recovery(
                &self.data_dir,
                RecoveryEntry::new(RecoveryCategory::Write, format!("{} write failed", STATE_FILE))
                    .field("Error", source.to_string())
                    .body(blob),
            );
            return Err(StoreError::Write { path, source });
        }
        Ok(())
    }
}

/// Keeps the blob in memory. Used by tests and by embedders that persist
/// elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub blob: Option<String>,
    pub saves: usize,
    /// When set, every `save` fails without touching `blob`
    pub fail_saves: bool,
    /// When set, every `load` fails with a read error
    pub fail_loads: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        MemoryStore {
            blob: Some(blob.into()),
            ..Self::default()
        }
    }

    /// Decode the last saved blob.
    pub fn saved_state(&self) -> Option<AppState> {
        self.blob.as_deref().and_then(|b| serde_json::from_str(b).ok())
    }
}

impl StateStore for MemoryStore {
    fn load(&mut self) -> Result<Option<AppState>, StoreError> {
        if self.fail_loads {
            return Err(StoreError::Read {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::other("loads disabled"),
            });
        }
        match &self.blob {
            None => Ok(None),
            Some(blob) => serde_json::from_str(blob)
                .map(Some)
                .map_err(|source| StoreError::Parse {
                    origin: "memory store".to_string(),
                    source,
                }),
        }
    }

    fn save(&mut self, state: &AppState) -> Result<(), StoreError> {
        if self.fail_saves {
            return Err(StoreError::Write {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::other("saves disabled"),
            });
        }
        self.blob = Some(serde_json::to_string(state)?);
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::recovery::read_recovery_entries;
    use crate::model::list::{DEFAULT_EMOJI, List};
    use crate::model::task::Task;
    use tempfile::TempDir;

    fn sample() -> AppState {
        let mut list = List::new("l_1".into(), "Mis tareas".into(), DEFAULT_EMOJI.into());
        list.tasks
            .push(Task::new_root("t_1".into(), "Buy milk".into(), "l_1".into()));
        AppState::seeded(list)
    }

    #[test]
    fn missing_file_loads_none() {
        let tmp = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(tmp.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(tmp.path().join("tasky"));
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));

        let raw = fs::read_to_string(store.state_path()).unwrap();
        assert!(raw.contains("\"currentListId\": \"l_1\""));
        assert!(raw.contains("\"listId\": \"l_1\""));
    }

    #[test]
    fn corrupt_blob_is_backed_up_and_logged() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(STATE_FILE), "{ not json").unwrap();
        let mut store = JsonFileStore::new(tmp.path());
        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));

        let backup = fs::read_to_string(tmp.path().join(BACKUP_FILE)).unwrap();
        assert_eq!(backup, "{ not json");
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Parser);
        assert_eq!(entries[0].body, "{ not json");
    }

    #[test]
    fn invalid_utf8_blob_is_backed_up_byte_for_byte() {
        let tmp = TempDir::new().unwrap();
        let mut raw = serde_json::to_vec(&sample()).unwrap();
        let at = raw.windows(4).position(|w| w == b"Mis ").unwrap();
        raw[at + 3] = 0xff;
        fs::write(tmp.path().join(STATE_FILE), &raw).unwrap();

        let mut store = JsonFileStore::new(tmp.path());
        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));

        assert_eq!(fs::read(tmp.path().join(BACKUP_FILE)).unwrap(), raw);
        assert_eq!(fs::read(store.state_path()).unwrap(), raw);
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Parser);
        assert!(entries[0].body.contains("Mis\u{FFFD}tareas"));
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_keeps_blob_in_recovery_log() {
        let tmp = TempDir::new().unwrap();
        // A directory where the state file should be makes the rename fail
        fs::create_dir_all(tmp.path().join(STATE_FILE).join("inner")).unwrap();
        let mut store = JsonFileStore::new(tmp.path());
        assert!(matches!(store.save(&sample()), Err(StoreError::Write { .. })));

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries[0].category, RecoveryCategory::Write);
        let unsaved: AppState = serde_json::from_str(&entries[0].body).unwrap();
        assert_eq!(unsaved, sample());
    }

    #[test]
    fn memory_store_counts_and_fails_on_request() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&sample()).unwrap();
        assert_eq!(store.saves, 1);
        assert_eq!(store.saved_state(), Some(sample()));

        store.fail_saves = true;
        assert!(store.save(&AppState::default()).is_err());
        assert_eq!(store.saves, 1);
        assert_eq!(store.saved_state(), Some(sample()));
    }

    #[test]
    fn memory_store_reports_parse_errors() {
        let mut store = MemoryStore::with_blob("{ truncated");
        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));
    }
}
