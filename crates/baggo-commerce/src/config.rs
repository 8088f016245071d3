//! Core configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use baggo_cache::Cache;

use crate::error::CommerceError;

/// Configuration for the commerce core.
///
/// Loaded from a TOML file, from environment variables, or built in code.
/// Every field has a default, so an empty file is a valid local-mode setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommerceConfig {
    /// Remote backend connection.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Local durable store.
    #[serde(default)]
    pub store: StoreConfig,

    /// Keys used inside the local store.
    #[serde(default)]
    pub keys: StoreKeys,
}

impl CommerceConfig {
    /// Load config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CommerceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CommerceError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| CommerceError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, CommerceError> {
        toml::from_str(content)
            .map_err(|e| CommerceError::Config(format!("Failed to parse TOML config: {e}")))
    }

    /// Build config from the process environment.
    ///
    /// Reads `BAGGO_REMOTE_URL`, `BAGGO_REMOTE_ANON_KEY`,
    /// `BAGGO_REMOTE_TIMEOUT_SECS` and `BAGGO_STORE_PATH`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("BAGGO_REMOTE_URL") {
            config.remote.url = url;
        }
        if let Some(key) = lookup("BAGGO_REMOTE_ANON_KEY") {
            config.remote.anon_key = key;
        }
        if let Some(secs) = lookup("BAGGO_REMOTE_TIMEOUT_SECS").and_then(|s| s.trim().parse().ok()) {
            config.remote.timeout_secs = secs;
        }
        if let Some(path) = lookup("BAGGO_STORE_PATH").filter(|p| !p.trim().is_empty()) {
            config.store.path = PathBuf::from(path);
        }
        config
    }

    /// Open the local durable store this config points at.
    pub fn open_cache(&self) -> Result<Cache, CommerceError> {
        Ok(Cache::open(&self.store.path)?)
    }
}

/// Remote backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Service root URL.
    #[serde(default)]
    pub url: String,

    /// Anonymous (public) API key.
    #[serde(default)]
    pub anon_key: String,

    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RemoteConfig {
    /// The remote backend is used only when both URL and key are present.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.anon_key.trim().is_empty()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Local durable store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the store file (default: baggo-store.json).
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("baggo-store.json")
}

/// Keys inside the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreKeys {
    #[serde(default = "default_cart_key")]
    pub cart: String,

    #[serde(default = "default_orders_key")]
    pub orders: String,

    #[serde(default = "default_favorites_key")]
    pub favorites: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            cart: default_cart_key(),
            orders: default_orders_key(),
            favorites: default_favorites_key(),
        }
    }
}

fn default_cart_key() -> String {
    "cart".to_string()
}

fn default_orders_key() -> String {
    "BAGGO_ORDERS_LOCAL_V1".to_string()
}

fn default_favorites_key() -> String {
    "BAGGO_FAV_V1".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_toml_is_local_defaults() {
        let config = CommerceConfig::from_toml_str("").unwrap();
        assert_eq!(config, CommerceConfig::default());
        assert!(!config.remote.is_configured());
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.keys.orders, "BAGGO_ORDERS_LOCAL_V1");
        assert_eq!(config.store.path, PathBuf::from("baggo-store.json"));
    }

    #[test]
    fn test_toml_overrides() {
        let config = CommerceConfig::from_toml_str(
            r#"
            [remote]
            url = "https://shop.example.co"
            anon_key = "public-key"
            timeout_secs = 5

            [keys]
            cart = "cart_v2"
            "#,
        )
        .unwrap();
        assert!(config.remote.is_configured());
        assert_eq!(config.remote.timeout_secs, 5);
        assert_eq!(config.keys.cart, "cart_v2");
        assert_eq!(config.keys.favorites, "BAGGO_FAV_V1");
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = CommerceConfig::from_toml_str("remote = 3").unwrap_err();
        assert!(matches!(err, CommerceError::Config(_)));
    }

    #[test]
    fn test_blank_credentials_are_not_configured() {
        let remote = RemoteConfig {
            url: "https://shop.example.co".into(),
            anon_key: "   ".into(),
            ..RemoteConfig::default()
        };
        assert!(!remote.is_configured());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("BAGGO_REMOTE_URL", "https://shop.example.co"),
            ("BAGGO_REMOTE_ANON_KEY", "k"),
            ("BAGGO_REMOTE_TIMEOUT_SECS", "12"),
            ("BAGGO_STORE_PATH", "/tmp/baggo.json"),
        ]
        .into_iter()
        .collect();
        let config = CommerceConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert!(config.remote.is_configured());
        assert_eq!(config.remote.timeout_secs, 12);
        assert_eq!(config.store.path, PathBuf::from("/tmp/baggo.json"));
    }
}
