//! Poll loop configuration.

use std::time::Duration;

/// Default delay between two status requests (in milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Poll loop configuration.
///
/// There is no timeout unless `max_attempts` is set: device operations may
/// legitimately run for a long time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Fixed delay between the end of one status request and the next one
    pub interval_ms: u64,
    /// Maximum number of status requests before giving up with `PollTimeout`.
    /// At least one request is always issued.
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollConfig {
    /// Creates a new config with the default interval and no attempt limit
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_attempts: None,
        }
    }

    /// Sets the delay between status requests
    #[must_use]
    pub const fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Sets the attempt budget
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Returns the delay between status requests.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Returns true once `attempts` requests exhaust the budget.
    #[must_use]
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_config_default() {
        let config = PollConfig::default();
        assert_eq!(config.interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert!(config.max_attempts.is_none());
        assert!(!config.is_exhausted(u32::MAX));
    }

    #[test]
    fn test_poll_config_custom() {
        let config = PollConfig::new()
            .with_interval_ms(250)
            .with_max_attempts(3);
        assert_eq!(config.interval(), Duration::from_millis(250));
        assert!(!config.is_exhausted(2));
        assert!(config.is_exhausted(3));
    }
}
