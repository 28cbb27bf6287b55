//! Timeout configuration for backend fetches.

use std::time::Duration;

/// Total budget for a single backend fetch. A fetch that exceeds it is a
/// transient failure: the feed keeps its current items and `has_more` state.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout configuration for a fetch operation.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// Total operation timeout.
    pub total: Duration,
}

impl TimeoutConfig {
    pub fn new(total: Duration) -> Self {
        Self { total }
    }

    /// The instant a fetch issued at `start` must be considered failed.
    pub fn deadline(&self, start: std::time::Instant) -> std::time::Instant {
        start + self.total
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            total: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget() {
        assert_eq!(TimeoutConfig::default().total, Duration::from_secs(15));
    }

    #[test]
    fn test_deadline() {
        let cfg = TimeoutConfig::new(Duration::from_secs(5));
        let start = std::time::Instant::now();
        assert_eq!(cfg.deadline(start), start + Duration::from_secs(5));
    }
}
