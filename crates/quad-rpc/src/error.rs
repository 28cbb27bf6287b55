//! Transport error types.

use std::time::Duration;

use thiserror::Error;

/// Errors from the backend RPC layer.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// The request exceeded its total timeout budget.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The request never reached the backend.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The response body did not match the expected shape.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// The request could not be constructed or sent.
    #[error("Request error: {0}")]
    Request(String),

    /// Unique-constraint violation (PostgreSQL 23505 / HTTP 409).
    ///
    /// For favorite membership this means the row already exists; callers
    /// treat it as success, not failure.
    #[error("Duplicate row")]
    Conflict,

    /// The backend rejected the credentials.
    #[error("Not authenticated")]
    Unauthenticated,
}

impl RpcError {
    /// Whether this failure is transient: the caller keeps its current state
    /// and a later retry may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Http { status, .. } => *status >= 500,
            RpcError::Timeout(_) | RpcError::Connection(_) => true,
            _ => false,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RpcError::Conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RpcError::Timeout(Duration::from_secs(15)).is_transient());
        assert!(RpcError::Connection("refused".into()).is_transient());
        assert!(RpcError::Http {
            status: 503,
            url: "u".into()
        }
        .is_transient());
        assert!(!RpcError::Http {
            status: 404,
            url: "u".into()
        }
        .is_transient());
        assert!(!RpcError::Conflict.is_transient());
    }
}
