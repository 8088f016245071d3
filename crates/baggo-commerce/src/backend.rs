//! Backend mode selection.

use std::fmt;
use std::sync::Arc;

use baggo_cache::Cache;
use baggo_data::{RemoteBackend, RestBackend};

use crate::config::CommerceConfig;
use crate::error::CommerceError;

/// Where persistent data lives.
///
/// Chosen once at startup and handed to every gateway. The two modes are
/// mutually exclusive and never reconciled.
#[derive(Clone)]
pub enum Backend {
    /// No remote service: orders go to the local durable store and remote-only
    /// features (promo codes, settings writes, admin checks) are unavailable.
    Local(Cache),
    /// A remote table service.
    Remote(Arc<dyn RemoteBackend>),
}

impl Backend {
    /// Select the backend mode from configuration.
    ///
    /// The remote backend is used iff both its URL and key are set.
    pub fn from_config(config: &CommerceConfig, cache: Cache) -> Result<Self, CommerceError> {
        if config.remote.is_configured() {
            let rest = RestBackend::new(
                &config.remote.url,
                &config.remote.anon_key,
                config.remote.timeout_secs,
            )?;
            tracing::debug!(url = %config.remote.url.trim(), "using remote backend");
            Ok(Backend::remote(rest))
        } else {
            tracing::debug!("remote backend not configured, using local store");
            Ok(Backend::Local(cache))
        }
    }

    /// Wrap a remote backend implementation.
    pub fn remote(backend: impl RemoteBackend + 'static) -> Self {
        Backend::Remote(Arc::new(backend))
    }

    /// Whether the remote backend is in use.
    pub fn is_remote(&self) -> bool {
        matches!(self, Backend::Remote(_))
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Local(cache) => f.debug_tuple("Local").field(cache).finish(),
            Backend::Remote(_) => f.write_str("Remote(..)"),
        }
    }
}

/// Successful result of a dual-mode gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub data: T,
    /// True when served by the local store rather than the remote backend.
    pub local: bool,
}

impl<T> Outcome<T> {
    pub fn remote(data: T) -> Self {
        Self { data, local: false }
    }

    pub fn local(data: T) -> Self {
        Self { data, local: true }
    }
}
