//! Durable Editor Snapshots
//!
//! Best-effort local persistence of the working copy, keyed by the asset's
//! composite identity. Storage problems never propagate to the caller; they
//! surface only as `NotSaved`/`NotFound` outcomes, and corrupt stored data
//! is treated as not-found.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

use super::EditorStore;
use crate::core::{manifest::Manifest, CoreError, CoreResult};

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a persist attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved,
    /// The write failed; the failure has been logged and swallowed
    NotSaved,
}

/// Result of a restore attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    /// No snapshot, unreadable storage, or corrupt data
    NotFound,
}

// =============================================================================
// Storage
// =============================================================================

/// Key-value string storage backing durable snapshots
pub trait SnapshotStorage: Send + Sync {
    fn read(&self, key: &str) -> CoreResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> CoreResult<()>;
}

/// In-memory storage for tests and ephemeral sessions
#[derive(Default)]
pub struct MemorySnapshotStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl SnapshotStorage for MemorySnapshotStorage {
    fn read(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> CoreResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-per-key storage under a snapshot directory
pub struct FileSnapshotStorage {
    dir: PathBuf,
}

impl FileSnapshotStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default per-user location for editor snapshots
    pub fn default_location() -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(base.join("mediadesk").join("snapshots"))
    }

    /// Maps a snapshot key to a filesystem-safe file name
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl SnapshotStorage for FileSnapshotStorage {
    fn read(&self, key: &str) -> CoreResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| CoreError::Storage(format!("read {}: {}", path.display(), e)))
    }

    fn write(&self, key: &str, value: &str) -> CoreResult<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| CoreError::Storage(format!("create {}: {}", self.dir.display(), e)))?;
        let path = self.path_for(key);
        std::fs::write(&path, value)
            .map_err(|e| CoreError::Storage(format!("write {}: {}", path.display(), e)))
    }
}

// =============================================================================
// Persist / Restore
// =============================================================================

/// Writes the store's current working copy to durable storage
pub fn persist(storage: &dyn SnapshotStorage, store: &EditorStore) -> PersistOutcome {
    let key = store.snapshot_key();
    let serialized = match serde_json::to_string(store.working_copy()) {
        Ok(s) => s,
        Err(e) => {
            warn!("snapshot serialize failed for {}: {}", key, e);
            return PersistOutcome::NotSaved;
        }
    };

    match storage.write(&key, &serialized) {
        Ok(()) => PersistOutcome::Saved,
        Err(e) => {
            warn!("snapshot write failed for {}: {}", key, e);
            PersistOutcome::NotSaved
        }
    }
}

/// Reads the stored snapshot and applies it with `set_manifest` semantics
/// (clean state, selections seeded where unset)
pub fn restore(storage: &dyn SnapshotStorage, store: &mut EditorStore) -> RestoreOutcome {
    let key = store.snapshot_key();
    let raw = match storage.read(&key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return RestoreOutcome::NotFound,
        Err(e) => {
            warn!("snapshot read failed for {}: {}", key, e);
            return RestoreOutcome::NotFound;
        }
    };

    match serde_json::from_str::<Manifest>(&raw) {
        Ok(manifest) => {
            store.set_manifest(manifest);
            RestoreOutcome::Restored
        }
        Err(e) => {
            warn!("corrupt snapshot for {}: {}", key, e);
            RestoreOutcome::NotFound
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
