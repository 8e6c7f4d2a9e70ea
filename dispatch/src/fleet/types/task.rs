//! Task handle and task result types.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Location at which a task's status and result can be polled.
///
/// Usually an absolute path such as `/unit_api/task_results/<id>`, resolved
/// against the fleet API base URL; full URLs are also accepted.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResultLocation(String);

impl ResultLocation {
    /// Creates a `ResultLocation`, returning `None` for an empty reference.
    #[must_use]
    pub fn new(location: &str) -> Option<Self> {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the string representation of this `ResultLocation`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a [`TaskHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    /// The task was accepted and has not reached a terminal status.
    #[default]
    Pending,
    /// The task completed; its result has been received.
    Complete,
    /// The task reported a terminal error.
    Failed,
}

impl TaskState {
    /// Returns true for `Complete` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// One outstanding asynchronous unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    result_location: ResultLocation,
    task_id: Option<String>,
    state: TaskState,
}

impl TaskHandle {
    /// Creates a pending handle for the given result location.
    #[must_use]
    pub fn new(result_location: ResultLocation) -> Self {
        Self {
            result_location,
            task_id: None,
            state: TaskState::Pending,
        }
    }

    /// Attaches the task id reported by the fleet API.
    #[must_use]
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Returns the location polled for this task's status.
    #[must_use]
    pub fn result_location(&self) -> &ResultLocation {
        &self.result_location
    }

    /// Returns the task id, if the fleet API reported one.
    #[must_use]
    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Moves the handle into a terminal state.
    ///
    /// Returns `false` and leaves the handle untouched if it is already
    /// terminal or `next` is not terminal.
    pub fn settle(&mut self, next: TaskState) -> bool {
        if self.state.is_terminal() || !next.is_terminal() {
            warn!(
                location = %self.result_location,
                from = ?self.state,
                to = ?next,
                "Ignoring invalid task state transition"
            );
            return false;
        }
        self.state = next;
        true
    }
}

/// Status reported by the task status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Still running.
    Pending,
    /// Finished successfully.
    Complete,
    /// Finished with an error.
    #[serde(alias = "failed")]
    Error,
}

impl TaskStatus {
    /// Returns true for `Complete` and `Error`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Body returned by the task status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFleetResult {
    /// Task status.
    pub status: TaskStatus,
    /// On completion, a mapping from unit identifier to per-unit payload.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Error message reported alongside an `error` status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RawFleetResult {
    /// Returns the best available description of a task failure.
    #[must_use]
    pub fn failure_message(&self) -> String {
        if let Some(error) = &self.error {
            return error.clone();
        }
        match &self.result {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => "task reported an error".to_string(),
            Some(other) => other.to_string(),
        }
    }
}
