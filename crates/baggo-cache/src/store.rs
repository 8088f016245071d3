//! Raw string stores backing [`Cache`](crate::Cache).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::CacheError;

/// A raw key-value store holding JSON text.
///
/// Writes are last-writer-wins; there is no merge or locking across
/// processes.
pub trait Store: Send + Sync {
    /// Get the raw text stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store raw text under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// List all keys in lexical order.
    fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }
}

fn lock(entries: &Mutex<BTreeMap<String, String>>) -> Result<MutexGuard<'_, BTreeMap<String, String>>, CacheError> {
    entries
        .lock()
        .map_err(|_| CacheError::StoreError("store lock poisoned".to_string()))
}

/// In-memory store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        lock(&self.entries)?.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }
}

/// File-backed store.
///
/// The whole store is a single JSON object (`{"key": "<json text>", ...}`)
/// kept in memory and rewritten on every mutation. Writes go to a sibling
/// temporary file first and are renamed into place, so a crash mid-write
/// leaves the previous contents intact. The in-memory copy only changes
/// once the file has been written.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating it lazily on first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    CacheError::OpenError(format!("{}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut entries = lock(&self.entries)?;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = lock(&self.entries)?;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }
}
