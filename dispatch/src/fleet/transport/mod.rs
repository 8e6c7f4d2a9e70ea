//! Network seam beneath the dispatcher and the poller.
//!
//! Transports only move bytes: status-code interpretation and body parsing
//! belong to the dispatcher and the poller, so both can be exercised against
//! scripted transports as well as a real HTTP server.

pub mod http;

pub use http::{HttpTransport, HttpTransportConfig};

use async_trait::async_trait;

/// A response as received from the fleet API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

impl TransportResponse {
    /// Creates a response with the given status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any response at all.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Connection, timeout or protocol failure.
    #[error("Network Error: {0}")]
    Network(String),
    /// The request could not be addressed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Moves requests to the fleet API and hands back raw responses.
///
/// Any response that arrives in full is `Ok`, whatever its status code.
/// `Err` means the request never completed: connection, timeout or
/// body-read failure, or a path that cannot be addressed.
#[async_trait]
pub trait FleetTransport: Send + Sync {
    /// Sends a `POST` with a JSON body to `path`, relative to the API base.
    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError>;

    /// Sends a `GET` to `path`, relative to the API base.
    async fn get(&self, path: &str) -> Result<TransportResponse, TransportError>;
}
