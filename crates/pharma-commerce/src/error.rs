//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in commerce operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommerceError {
    /// Malformed input caught before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Product resolution failed while adding a new cart line.
    #[error("Catalog lookup failed for {product_id}: {reason}")]
    CatalogLookup { product_id: String, reason: String },

    /// Lifecycle transition attempted from a disallowed state.
    #[error("Cannot {action} an order that is {status}")]
    InvalidState { action: &'static str, status: String },

    /// The actor lacks the privilege for this operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Network or server failure.
    #[error("Remote error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// A cached collection expired; callers refetch transparently.
    #[error("Stale cache: {0}")]
    StaleCache(String),

    /// The server answered with a shape we could not use.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Durable cart store failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CommerceError {
    /// Shorthand for a transport-level failure with no HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        CommerceError::Remote {
            status: 0,
            message: message.into(),
        }
    }

    /// True for 401/403 responses. These are surfaced, never retried.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, CommerceError::Remote { status: 401 | 403, .. })
    }

    /// True when the error never left the client.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            CommerceError::Validation(_)
                | CommerceError::InvalidState { .. }
                | CommerceError::Unauthorized(_)
        )
    }
}

impl From<pharma_cache::CacheError> for CommerceError {
    fn from(e: pharma_cache::CacheError) -> Self {
        match e {
            pharma_cache::CacheError::Stale(name) | pharma_cache::CacheError::Empty(name) => {
                CommerceError::StaleCache(name.to_string())
            }
            pharma_cache::CacheError::SerializeError(e) => {
                CommerceError::Serialization(e.to_string())
            }
            other => CommerceError::Storage(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Serialization(e.to_string())
    }
}
