//! Poll loop configuration.

use crate::fleet::poller::{PollConfig, DEFAULT_POLL_INTERVAL_MS};
use serde::Deserialize;

/// Poll loop settings.
#[derive(Debug, Deserialize, Clone)]
pub struct PollingSettings {
    /// Delay between status requests of one loop.
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    /// Optional attempt budget; unset polls until a terminal status.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_attempts: None,
        }
    }
}

impl PollingSettings {
    /// Converts the settings into a [`PollConfig`].
    #[must_use]
    pub fn poll_config(&self) -> PollConfig {
        let config = PollConfig::new().with_interval_ms(self.interval_ms);
        match self.max_attempts {
            Some(attempts) => config.with_max_attempts(attempts),
            None => config,
        }
    }
}

fn default_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
