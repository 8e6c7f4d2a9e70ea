//! Configuration management for fleet dispatch.
//!
//! Settings come from built-in defaults overridden by environment variables
//! prefixed with `FLEET`, using `__` as the section separator
//! (e.g. `FLEET__POLLING__MAX_ATTEMPTS=30`).
//!
//! # Example
//!
//! ```
//! use fleet_dispatch::infrastructure::config::Settings;
//!
//! let settings = Settings::new().expect("Failed to load configuration");
//! assert!(settings.polling.interval_ms > 0);
//! ```

pub mod fleet;
pub mod polling;
pub mod telemetry;

pub use fleet::FleetSettings;
pub use polling::PollingSettings;
pub use telemetry::TelemetrySettings;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Fleet API settings.
    pub fleet: FleetSettings,
    /// Poll loop settings.
    #[serde(default)]
    pub polling: PollingSettings,
    /// Telemetry settings.
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Creates a new settings instance from environment variables and defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_environment(environment())
    }

    /// Builds settings from the defaults overridden by `environment`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Start with default values
            .set_default("fleet.base_url", fleet::DEFAULT_BASE_URL)?
            .set_default("fleet.request_timeout_ms", fleet::DEFAULT_REQUEST_TIMEOUT_MS)?
            .set_default("telemetry.service_name", "fleet-dispatch")?
            .set_default("telemetry.log_level", "info")?
            .set_default("telemetry.sampling_ratio", 1.0)?
            .add_source(environment)
            .build()?;

        s.try_deserialize()
    }
}

/// The `FLEET__SECTION__KEY` environment source.
fn environment() -> Environment {
    Environment::with_prefix("FLEET")
        .separator("__")
        .try_parsing(true)
}
