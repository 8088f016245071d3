//! Remote backend error types.

use thiserror::Error;

/// Errors that can occur when talking to the remote backend.
///
/// The `Display` output is meant to be shown to an end user as-is, so
/// service-level messages are passed through without decoration.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Invalid base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse response body.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The backend refused the operation (used by non-HTTP backends).
    #[error("{0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::ParseError(e.to_string())
    }
}
