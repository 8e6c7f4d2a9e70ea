//! Fleet API configuration.

use crate::fleet::types::FleetError;
use crate::fleet::HttpTransportConfig;
use serde::Deserialize;

/// Default leader address.
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

pub use crate::fleet::transport::http::DEFAULT_REQUEST_TIMEOUT_MS;

/// Where and how to reach the fleet API.
#[derive(Debug, Deserialize, Clone)]
pub struct FleetSettings {
    /// Base URL of the fleet leader; request paths are resolved against it.
    pub base_url: String,
    /// Timeout for each individual HTTP request.
    pub request_timeout_ms: u64,
}

impl FleetSettings {
    /// Converts the settings into a transport configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::Config`] if `base_url` is not an absolute URL.
    pub fn transport_config(&self) -> Result<HttpTransportConfig, FleetError> {
        let base_url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| FleetError::Config(format!("invalid base_url '{}': {e}", self.base_url)))?;
        Ok(HttpTransportConfig::new(base_url).with_request_timeout_ms(self.request_timeout_ms))
    }
}
