//! Retry policy for backend fetches.
//!
//! Only failures the backend never saw (connection errors) or 5xx responses
//! are retried; everything else is surfaced to the caller immediately. There
//! is no backoff: the Spin executor exposes no timer, and the feed layer
//! already treats a failed fetch as recoverable.

use crate::error::RpcError;

/// Retry policy for a fetch operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the initial try.
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self { max_retries: 0 }
    }

    /// Whether `error` on 0-indexed `attempt` warrants another try.
    pub fn should_retry(&self, error: &RpcError, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        match error {
            RpcError::Connection(_) => true,
            RpcError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Timeout + retry combined, the unit the client is configured with.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchPolicy {
    pub timeout: crate::timeout::TimeoutConfig,
    pub retry: RetryPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_server_errors_only() {
        let policy = RetryPolicy::new(1);
        let server = RpcError::Http {
            status: 502,
            url: "u".into(),
        };
        let client_err = RpcError::Http {
            status: 400,
            url: "u".into(),
        };
        assert!(policy.should_retry(&server, 0));
        assert!(!policy.should_retry(&server, 1));
        assert!(!policy.should_retry(&client_err, 0));
        assert!(!policy.should_retry(&RpcError::Conflict, 0));
        assert!(policy.should_retry(&RpcError::Connection("reset".into()), 0));
    }

    #[test]
    fn test_none_never_retries() {
        let policy = RetryPolicy::none();
        assert!(!policy.should_retry(&RpcError::Connection("reset".into()), 0));
    }
}
