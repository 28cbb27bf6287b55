//! Domain error types.
//!
//! Nothing in the feed/search core is fatal: every variant here degrades to a
//! visible-but-recoverable UI state.

use thiserror::Error;

/// Errors surfaced by marketplace operations.
#[derive(Error, Debug)]
pub enum MarketError {
    /// Listing not found (or no longer visible).
    #[error("Listing not found: {0}")]
    ListingNotFound(String),

    /// The viewer must sign in before this action.
    #[error("Sign-in required")]
    SignInRequired,

    /// The backend reported a failure.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MarketError {
    fn from(e: serde_json::Error) -> Self {
        MarketError::Serialization(e.to_string())
    }
}
