//! Key-Value store wrapper with automatic serialization.

use std::path::Path;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::store::{FileStore, MemoryStore, Store};
use crate::CacheError;

/// Type-safe cache backed by a [`Store`].
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`. Cloning is cheap; clones share the
/// same underlying store, which makes one `Cache` usable process-wide.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl Cache {
    /// Open a durable, file-backed cache.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cache = Cache::open("baggo-store.json")?;
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        Ok(Self::with_store(FileStore::open(path)?))
    }

    /// Create an in-memory cache (for development/testing).
    pub fn in_memory() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Wrap an arbitrary store.
    pub fn with_store(store: impl Store + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let lines: Option<Vec<CartLine>> = cache.get("cart")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Get a value, falling back to `T::default()` when the key is missing
    /// or its contents cannot be decoded.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "unreadable cache entry, using default");
                T::default()
            }
        }
    }

    /// Get a list, decoding each element on its own.
    ///
    /// Elements that fail to decode are skipped with a warning so one bad
    /// entry does not cost the rest. A missing key or a value that is not
    /// a list yields an empty list.
    pub fn get_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let items: Vec<serde_json::Value> = self.get_or_default(key);
        items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(key, index, error = %e, "skipping unreadable list entry");
                    None
                }
            })
            .collect()
    }

    /// Set a value in the cache.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// cache.set("cart", &lines)?;
    /// ```
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let text = serde_json::to_string(value)?;
        self.store.set(key, text)
    }

    /// Delete a value from the cache.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key)
    }

    /// Check if a key exists in the cache.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.store.exists(key)
    }

    /// Get all keys in the cache.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.store.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Line {
        id: String,
        quantity: u32,
    }

    #[test]
    fn test_typed_roundtrip() {
        let cache = Cache::in_memory();
        let lines = vec![Line {
            id: "p1".to_string(),
            quantity: 2,
        }];

        cache.set("cart", &lines).unwrap();
        let loaded: Option<Vec<Line>> = cache.get("cart").unwrap();
        assert_eq!(loaded, Some(lines));
    }

    #[test]
    fn test_list_skips_bad_entries() {
        let cache = Cache::in_memory();
        cache
            .set(
                "cart",
                &serde_json::json!([{"id": "p1", "quantity": 2}, null, {"id": "p2"}, {"id": "p3", "quantity": 1}]),
            )
            .unwrap();
        let lines: Vec<Line> = cache.get_list("cart");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].id, "p1");
        assert_eq!(lines[1].id, "p3");

        cache.set("cart", &serde_json::json!({"not": "a list"})).unwrap();
        assert!(cache.get_list::<Line>("cart").is_empty());
        assert!(cache.get_list::<Line>("missing").is_empty());
    }

    #[test]
    fn test_missing_key() {
        let cache = Cache::in_memory();
        let loaded: Option<Vec<Line>> = cache.get("nope").unwrap();
        assert!(loaded.is_none());
        assert!(!cache.exists("nope").unwrap());
    }

    #[test]
    fn test_get_or_default_on_garbage() {
        let store = MemoryStore::new();
        store.set("cart", "{broken".to_string()).unwrap();
        let cache = Cache::with_store(store);

        let lines: Vec<Line> = cache.get_or_default("cart");
        assert!(lines.is_empty());
        assert!(cache.get::<Vec<Line>>("cart").is_err());
    }

    #[test]
    fn test_clones_share_store() {
        let cache = Cache::in_memory();
        let other = cache.clone();
        cache.set("favs", &vec!["a".to_string()]).unwrap();

        let favs: Vec<String> = other.get_or_default("favs");
        assert_eq!(favs, vec!["a".to_string()]);

        other.delete("favs").unwrap();
        assert_eq!(cache.keys().unwrap(), Vec::<String>::new());
    }
}
