//! Command and query submission.
//!
//! A submission is a single request to the fleet API. On acceptance the API
//! answers immediately with the location at which the task's result will
//! appear; the work itself runs on the units. Submissions are at-most-once:
//! a failed submission is reported, never re-sent.

use crate::fleet::transport::{FleetTransport, TransportError, TransportResponse};
use crate::fleet::types::{CommandArg, FleetError, ResultLocation, TaskHandle, UnitTarget};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// =============================================================================
// Wire DTOs
// =============================================================================

#[derive(Serialize)]
struct CommandBody<'a> {
    args: &'a [CommandArg],
    options: &'a BTreeMap<String, CommandArg>,
}

#[derive(Deserialize)]
struct AcceptedTask {
    #[serde(alias = "result_location")]
    result_url_path: Option<String>,
    task_id: Option<String>,
}

// =============================================================================
// Domain
// =============================================================================

/// A command addressed to one unit or to the whole fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    name: String,
    target: UnitTarget,
    args: Vec<CommandArg>,
    options: BTreeMap<String, CommandArg>,
}

impl Command {
    /// Creates a command with no arguments or options.
    pub fn new(name: impl Into<String>, target: UnitTarget) -> Self {
        Self {
            name: name.into(),
            target,
            args: Vec::new(),
            options: BTreeMap::new(),
        }
    }

    /// Appends a positional argument
    #[must_use]
    pub fn arg(mut self, value: impl Into<CommandArg>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Sets an option. Options that are never set are not sent.
    #[must_use]
    pub fn option(mut self, name: impl Into<String>, value: impl Into<CommandArg>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Returns the command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the addressee.
    #[must_use]
    pub fn target(&self) -> &UnitTarget {
        &self.target
    }

    /// Returns the positional arguments in order.
    #[must_use]
    pub fn args(&self) -> &[CommandArg] {
        &self.args
    }

    /// Returns the options that were set.
    #[must_use]
    pub fn options(&self) -> &BTreeMap<String, CommandArg> {
        &self.options
    }
}

/// Submits commands and queries to the fleet API.
#[derive(Clone)]
pub struct CommandDispatcher {
    transport: Arc<dyn FleetTransport>,
}

impl CommandDispatcher {
    /// Creates a dispatcher over the given transport.
    pub fn new(transport: Arc<dyn FleetTransport>) -> Self {
        Self { transport }
    }

    /// Submits a command and returns the pending task it started.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if the command name is not a valid path segment
    /// - `DispatchFailed` on network failure or a non-2xx status
    /// - `MalformedResponse` if the accepted response has no result location
    /// - `Cancelled` if `cancel` fires before the response arrives
    pub async fn dispatch(
        &self,
        command: &Command,
        cancel: &CancellationToken,
    ) -> Result<TaskHandle, FleetError> {
        validate_segment("command name", &command.name)?;
        let path = format!(
            "api/units/{}/commands/{}",
            command.target.path_segment(),
            command.name
        );
        let body = serde_json::to_value(CommandBody {
            args: &command.args,
            options: &command.options,
        })
        .map_err(|e| FleetError::InvalidRequest(format!("Unserializable arguments: {e}")))?;

        info!(
            command = %command.name,
            target = %command.target,
            args = command.args.len(),
            "Dispatching fleet command"
        );

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FleetError::Cancelled),
            res = self.transport.post(&path, &body) => res,
        };
        let response = sent.map_err(|e| match e {
            TransportError::InvalidUrl(msg) => FleetError::Config(msg),
            TransportError::Network(body) => FleetError::DispatchFailed { status: None, body },
        })?;

        accept(&response)
    }

    /// Submits a read-only query (e.g. `calibrations`) and returns the pending
    /// task that will carry its per-unit answers.
    ///
    /// # Errors
    ///
    /// Same as [`CommandDispatcher::dispatch`].
    pub async fn query(
        &self,
        resource: &str,
        target: &UnitTarget,
        cancel: &CancellationToken,
    ) -> Result<TaskHandle, FleetError> {
        validate_segment("resource", resource)?;
        let path = format!("api/units/{}/{resource}", target.path_segment());
        debug!(%resource, %target, "Submitting fleet query");

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FleetError::Cancelled),
            res = self.transport.get(&path) => res,
        };
        let response = sent.map_err(|e| match e {
            TransportError::InvalidUrl(msg) => FleetError::Config(msg),
            TransportError::Network(body) => FleetError::DispatchFailed { status: None, body },
        })?;

        accept(&response)
    }
}

fn validate_segment(what: &str, segment: &str) -> Result<(), FleetError> {
    let valid = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(FleetError::InvalidRequest(format!(
            "Invalid {what}: '{segment}'"
        )))
    }
}

/// Maps the submission response onto a pending handle.
fn accept(response: &TransportResponse) -> Result<TaskHandle, FleetError> {
    if !response.is_success() {
        warn!(status = response.status, "Fleet API rejected submission");
        return Err(FleetError::DispatchFailed {
            status: Some(response.status),
            body: response.body.clone(),
        });
    }

    let accepted: AcceptedTask = serde_json::from_str(&response.body)
        .map_err(|e| FleetError::MalformedResponse(format!("Parse error: {e}")))?;

    let location = accepted
        .result_url_path
        .as_deref()
        .and_then(ResultLocation::new)
        .ok_or_else(|| {
            FleetError::MalformedResponse("Response has no result location".to_string())
        })?;

    debug!(%location, task_id = ?accepted.task_id, "Task accepted");
    let handle = TaskHandle::new(location);
    Ok(match accepted.task_id {
        Some(id) => handle.with_task_id(id),
        None => handle,
    })
}
