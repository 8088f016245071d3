//! Remote backend gateway for the storefront.
//!
//! The storefront treats its remote service as an opaque, row-oriented
//! request/response gateway. This crate provides:
//!
//! - [`RemoteBackend`] - the async contract the commerce core talks to
//! - [`RestBackend`] - a PostgREST-dialect client built on `reqwest`
//! - [`MemoryBackend`] - an in-process implementation for tests and demos
//!
//! # Example
//!
//! ```rust,ignore
//! use baggo_data::{Filter, RemoteBackend, RestBackend};
//!
//! let backend = RestBackend::new("https://project.example.co", "anon-key", 30)?;
//!
//! let promo = backend
//!     .select_one("promo_codes", &Filter::eq("code", "SAVE10"))
//!     .await?;
//! ```

mod backend;
mod error;
mod memory;
mod rest;

pub use backend::{Direction, Filter, OrderBy, RemoteBackend, Row};
pub use error::RemoteError;
pub use memory::MemoryBackend;
pub use rest::RestBackend;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Filter, MemoryBackend, OrderBy, RemoteBackend, RemoteError, RestBackend, Row};
}
