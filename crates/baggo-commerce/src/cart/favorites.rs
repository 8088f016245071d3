//! Favourited products.

use serde_json::Value;

use baggo_cache::Cache;

use crate::ids::ProductId;

/// Product ids the shopper has favourited, persisted on every toggle.
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    cache: Cache,
    key: String,
    ids: Vec<ProductId>,
}

impl FavoritesStore {
    /// Load favourites saved under `key`; unreadable data loads as empty.
    pub fn load(cache: Cache, key: impl Into<String>) -> Self {
        let key = key.into();
        let raw: Vec<Value> = cache.get_or_default(&key);
        let ids = raw
            .iter()
            .map(ProductId::from_value)
            .filter(|id| !id.is_empty())
            .collect();
        Self { cache, key, ids }
    }

    /// Flip `id` in or out of the set. Empty ids are ignored.
    ///
    /// Returns whether the product is a favourite afterwards.
    pub fn toggle(&mut self, id: &ProductId) -> bool {
        if id.is_empty() {
            return false;
        }
        let now_favorite = match self.ids.iter().position(|x| x == id) {
            Some(index) => {
                self.ids.remove(index);
                false
            }
            None => {
                self.ids.push(id.clone());
                true
            }
        };
        if let Err(e) = self.cache.set(&self.key, &self.ids) {
            tracing::warn!(key = %self.key, error = %e, "failed to persist favorites");
        }
        now_favorite
    }

    pub fn is_favorite(&self, id: &ProductId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_toggle_and_persist() {
        let cache = Cache::in_memory();
        let mut favs = FavoritesStore::load(cache.clone(), "favs");
        let id = ProductId::new("7");

        assert!(favs.toggle(&id));
        assert!(favs.is_favorite(&id));

        let reloaded = FavoritesStore::load(cache.clone(), "favs");
        assert_eq!(reloaded.ids(), &[id.clone()]);

        assert!(!favs.toggle(&id));
        assert!(FavoritesStore::load(cache, "favs").ids().is_empty());
    }

    #[test]
    fn test_empty_id_ignored() {
        let mut favs = FavoritesStore::load(Cache::in_memory(), "favs");
        assert!(!favs.toggle(&ProductId::new("")));
        assert!(favs.ids().is_empty());
    }

    #[test]
    fn test_numeric_ids_load_as_text() {
        let cache = Cache::in_memory();
        cache.set("favs", &json!([3, "9", null])).unwrap();
        let favs = FavoritesStore::load(cache, "favs");
        assert!(favs.is_favorite(&ProductId::new("3")));
        assert!(favs.is_favorite(&ProductId::new("9")));
        assert_eq!(favs.ids().len(), 2);
    }
}
