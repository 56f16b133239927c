//! Keyed string storage used for the durable session and the transient result handoff.
//!
//! Values are opaque strings at this layer; typed parsing happens in the owning component
//! (`session`, `handoff`). Multi-key writes and removals are applied as one unit so a crash or
//! concurrent reader never observes half of a pair.

use crate::{GlycoError, GlycoResult};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> GlycoResult<Option<String>>;

    /// Writes every pair, or none of them.
    fn set_many(&self, entries: &[(&str, String)]) -> GlycoResult<()>;

    /// Removes every key, or none of them. Missing keys are not an error.
    fn remove_many(&self, keys: &[&str]) -> GlycoResult<()>;

    fn set(&self, key: &str, value: String) -> GlycoResult<()> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> GlycoResult<()> {
        self.remove_many(&[key])
    }
}

/// Process-lifetime storage. Stands in for per-tab session storage, and for durable storage in
/// tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // Batches only use infallible map operations, so a poisoned map is still whole.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> GlycoResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> GlycoResult<()> {
        let mut map = self.lock();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> GlycoResult<()> {
        let mut map = self.lock();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// Durable storage in a single JSON object file.
///
/// Every mutation rewrites the file through a temporary sibling and a rename, so the file on
/// disk always holds either the previous or the next complete map.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    /// Opens (or prepares to create) the store at `path`. The parent directory is created if
    /// missing.
    pub fn open(path: impl Into<PathBuf>) -> GlycoResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(GlycoError::StorageWrite)?;
        }
        Ok(Self {
            path,
            guard: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> GlycoResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(GlycoError::Deserialization),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(GlycoError::StorageRead(e)),
        }
    }

    fn persist(&self, map: &BTreeMap<String, String>) -> GlycoResult<()> {
        let json = serde_json::to_string_pretty(map).map_err(GlycoError::Serialization)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(GlycoError::StorageWrite)?;
        fs::rename(&tmp, &self.path).map_err(GlycoError::StorageWrite)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> GlycoResult<Option<String>> {
        let _guard = self.guard.lock().unwrap_or_else(|p| p.into_inner());
        Ok(self.load()?.get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> GlycoResult<()> {
        let _guard = self.guard.lock().unwrap_or_else(|p| p.into_inner());
        let mut map = self.load()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        self.persist(&map)
    }

    fn remove_many(&self, keys: &[&str]) -> GlycoResult<()> {
        let _guard = self.guard.lock().unwrap_or_else(|p| p.into_inner());
        let mut map = match self.load() {
            Ok(map) => map,
            Err(GlycoError::Deserialization(e)) => {
                tracing::warn!(
                    "discarding unreadable store {}: {}",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        for key in keys {
            map.remove(*key);
        }
        self.persist(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        store
            .set_many(&[("a", "1".into()), ("b", "2".into())])
            .unwrap();

        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove_many(&["a", "b", "missing"]).unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("session.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("auth_token", "tok".into()).unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("auth_token").unwrap().as_deref(), Some("tok"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn file_store_missing_file_reads_as_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path().join("absent.json")).unwrap();

        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn file_store_corrupt_file_errors_on_read_but_can_be_cleared() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(matches!(
            store.get("auth_token"),
            Err(GlycoError::Deserialization(_))
        ));

        store.remove_many(&["auth_token", "auth_user"]).unwrap();
        assert_eq!(store.get("auth_token").unwrap(), None);
    }
}
