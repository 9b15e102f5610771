//! Domain errors for Barback.

use thiserror::Error;

/// Failures reported by a record store.
///
/// Produced by every [`RecordStore`](crate::domain::ports::RecordStore)
/// implementation, so callers classify failures the same way whether the
/// store is remote or in memory.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend refused the request for the credential used (HTTP 401/403).
    #[error("Permission denied ({status}): {message}")]
    PermissionDenied { status: u16, message: String },

    /// Unknown table or route (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate key or other constraint conflict (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Schema mismatch, bad filter or malformed payload (HTTP 400 and other 4xx).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Backend asked us to slow down (HTTP 429).
    #[error("Rate limit exceeded - too many requests")]
    RateLimited,

    /// Backend failure (HTTP 5xx).
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Connection could not be made or was dropped.
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout.
    #[error("Request timeout")]
    Timeout,

    /// Response body was not the expected JSON.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Update or delete issued without any filter.
    #[error("Refusing to {operation} every row of '{table}': no filter given")]
    UnfilteredMutation {
        operation: &'static str,
        table: String,
    },

    /// Count response carried no usable `Content-Range` header.
    #[error("Invalid Content-Range header: {0}")]
    InvalidCountHeader(String),
}

impl BackendError {
    /// Returns true if repeating the same request may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Server { .. } | Self::Network(_) | Self::Timeout
        )
    }

    /// Returns true if the backend rejected the credential's privilege.
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

pub type StoreResult<T> = Result<T, BackendError>;

/// Domain-level errors raised by the maintenance services.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
