//! HTTP transport for the fleet API.

use super::{FleetTransport, TransportError, TransportResponse};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL of the fleet API; paths are joined onto it.
    pub base_url: Url,
    /// Per-request timeout
    pub request_timeout_ms: Option<u64>,
}

impl HttpTransportConfig {
    /// Creates a new config with the default request timeout
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout_ms: None,
        }
    }

    /// Sets the per-request timeout
    #[must_use]
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = Some(timeout_ms);
        self
    }
}

/// [`FleetTransport`] backed by `reqwest`.
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Creates a new transport with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let timeout = config
            .request_timeout_ms
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn into_response(res: reqwest::Response) -> Result<TransportResponse, TransportError> {
        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| TransportError::Network(format!("Failed to read body: {e}")))?;
        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl FleetTransport for HttpTransport {
    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.resolve(path)?;
        debug!(%url, "POST");
        let res = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::into_response(res).await
    }

    async fn get(&self, path: &str) -> Result<TransportResponse, TransportError> {
        let url = self.resolve(path)?;
        debug!(%url, "GET");
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::into_response(res).await
    }
}
