//! Commerce error types.
//!
//! Normalization (stock, image metadata, pricing) never fails. Only
//! operations that touch a store or apply a business rule return one of
//! these errors; their `Display` text is what a storefront shows the user.

use thiserror::Error;

use baggo_cache::CacheError;
use baggo_data::RemoteError;

/// Errors raised while setting the core up.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The local durable store could not be opened.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// The remote client could not be constructed.
    #[error("Remote backend error: {0}")]
    Remote(#[from] RemoteError),
}

/// Reasons a promo code is refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PromoError {
    /// No remote backend: promo codes are unsupported entirely.
    #[error("Promo codes aren't available in demo mode.")]
    Disabled,

    /// Malformed input or record (empty code, non-positive value).
    #[error("{0}")]
    Invalid(String),

    #[error("Invalid promo code.")]
    NotFound,

    #[error("This promo code is inactive.")]
    Inactive,

    #[error("This promo code has expired.")]
    Expired,

    /// Network or service failure; the original message is preserved.
    #[error("{0}")]
    RemoteFailure(String),
}

impl From<RemoteError> for PromoError {
    fn from(e: RemoteError) -> Self {
        PromoError::RemoteFailure(e.to_string())
    }
}

/// Failures of the dual-mode order and settings gateways.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The operation is not available in the current backend mode.
    #[error("{0}")]
    Unsupported(String),

    /// Network or service failure; the original message is preserved.
    #[error("{0}")]
    RemoteFailure(String),

    /// The local durable store could not be written.
    #[error("Local store error: {0}")]
    Store(String),
}

impl From<RemoteError> for GatewayError {
    fn from(e: RemoteError) -> Self {
        GatewayError::RemoteFailure(e.to_string())
    }
}

impl From<CacheError> for GatewayError {
    fn from(e: CacheError) -> Self {
        GatewayError::Store(e.to_string())
    }
}
