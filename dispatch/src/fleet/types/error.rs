//! Error types for fleet operations.
//!
//! Every variant surfaces to the immediate caller; none is retried by this
//! crate. Partial fleet failure is not an error: units that never answered
//! are simply absent from a result.

/// Errors that can occur while dispatching or following a fleet task.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FleetError {
    /// The command could not be submitted (network failure or non-2xx status).
    #[error("Dispatch Failed{}: {body}", format_status(.status))]
    DispatchFailed {
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Response body or transport error text.
        body: String,
    },
    /// An accepted response lacked a required field or could not be parsed.
    #[error("Malformed Response: {0}")]
    MalformedResponse(String),
    /// The attempt budget ran out while the task was still pending.
    #[error("Poll Timeout: task still pending after {attempts} attempts")]
    PollTimeout {
        /// Number of status requests issued.
        attempts: u32,
    },
    /// The task itself reported a terminal error.
    #[error("Task Failed: {0}")]
    TaskFailed(String),
    /// The caller cancelled the operation.
    #[error("Cancelled")]
    Cancelled,
    /// A status request failed (network failure, non-2xx status or unparseable body).
    #[error("Poll Failed{}: {body}", format_status(.status))]
    PollFailed {
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Response body or transport error text.
        body: String,
    },
    /// The request was rejected before any network traffic.
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),
    /// Configuration error
    #[error("Configuration Error: {0}")]
    Config(String),
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl FleetError {
    /// Returns `true` if this error was caused by the caller cancelling.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if the task ran to completion on the fleet side and failed.
    #[must_use]
    pub fn is_task_failure(&self) -> bool {
        matches!(self, Self::TaskFailed(_))
    }

    /// Returns the HTTP status attached to this error, if any.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::DispatchFailed { status, .. } | Self::PollFailed { status, .. } => *status,
            _ => None,
        }
    }
}
