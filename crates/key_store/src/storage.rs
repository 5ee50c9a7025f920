//! Snapshot persistence backends.

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

/// Where the serialized key snapshot lives between runs.
pub trait SnapshotStorage: Send + Sync {
    fn load(&self) -> Option<String>;
    fn store(&self, snapshot: &str) -> io::Result<()>;
}

/// Snapshot file under the platform config directory, e.g.
/// `~/.config/genai-playground/genai-playground-api-keys.json`.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base
                .join("genai-playground")
                .join(format!("{}.json", crate::STORAGE_KEY)),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStorage for FileStorage {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Some(contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                log::warn!("Failed to read key snapshot {}: {err}", self.path.display());
                None
            }
        }
    }

    fn store(&self, snapshot: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, snapshot)
    }
}

/// In-memory backend for tests.
#[derive(Default)]
pub struct MemoryStorage {
    snapshot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self) -> Option<String> {
        self.snapshot.lock().ok()?.clone()
    }

    fn store(&self, snapshot: &str) -> io::Result<()> {
        if let Ok(mut slot) = self.snapshot.lock() {
            *slot = Some(snapshot.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::with_path(dir.path().join("keys.json"));
        assert!(storage.load().is_none());

        storage.store(r#"{"openai":{}}"#).unwrap();
        assert_eq!(storage.load().unwrap(), r#"{"openai":{}}"#);
    }

    #[test]
    fn file_storage_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::with_path(dir.path().join("nested/deeper/keys.json"));
        storage.store("{}").unwrap();
        assert_eq!(storage.load().unwrap(), "{}");
    }

    #[test]
    fn memory_storage_round_trips() {
        let storage = MemoryStorage::new();
        assert!(storage.load().is_none());
        storage.store("snapshot").unwrap();
        assert_eq!(storage.load().unwrap(), "snapshot");
    }
}
