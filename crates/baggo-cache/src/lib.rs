//! Durable local key-value store for the storefront.
//!
//! Provides a small, ergonomic API for persisting state (cart lines, local
//! orders, favourites) with automatic JSON serialization. Values are stored
//! as JSON text under string keys, the same shape a browser's local storage
//! would hold, so data written by one process is readable by the next.
//!
//! # Example
//!
//! ```rust,ignore
//! use baggo_cache::Cache;
//!
//! let cache = Cache::open("baggo-store.json")?;
//!
//! // Store a value
//! cache.set("cart", &lines)?;
//!
//! // Retrieve a value
//! let lines: Option<Vec<CartLine>> = cache.get("cart")?;
//!
//! // Delete a value
//! cache.delete("cart")?;
//! ```

mod error;
mod kv;
mod store;

pub use error::CacheError;
pub use kv::Cache;
pub use store::{FileStore, MemoryStore, Store};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, FileStore, MemoryStore, Store};
}
