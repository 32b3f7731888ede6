//! Error types for authorization code operations

/// Errors from building the authorization request or exchanging a code.
///
/// None of these are retried. The service maps every variant to a 500.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {field} URL: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("token endpoint timed out: {0}")]
    Timeout(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("failed to read token response body: {0}")]
    Body(String),
}

/// Result alias for authorization code operations.
pub type Result<T> = std::result::Result<T, Error>;
