//! Per-view session state.
//!
//! A [`FleetSession`] is constructed explicitly by whoever owns a view and
//! passed by reference to the code that fetches for it. Every submission and
//! every await it performs runs under the session's cancellation scope, so
//! closing the session (or dropping it) stops every poll loop it started.

use crate::coverage::{CoverageMatrix, CoverageMatrixBuilder, ResourceFamily};
use crate::fleet::aggregator::{normalize, UnitResults};
use crate::fleet::dispatcher::{Command, CommandDispatcher};
use crate::fleet::poller::{PollConfig, TaskPoller};
use crate::fleet::transport::FleetTransport;
use crate::fleet::types::{ActiveResources, FleetError, ResourceListing, UnitTarget};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Dispatcher, poller and cancellation scope owned by one view.
pub struct FleetSession {
    dispatcher: CommandDispatcher,
    poller: TaskPoller,
    scope: CancellationToken,
}

impl FleetSession {
    /// Creates a session with its own dispatcher and poller over `transport`.
    pub fn new(transport: Arc<dyn FleetTransport>, poll: PollConfig) -> Self {
        Self::from_parts(
            CommandDispatcher::new(Arc::clone(&transport)),
            TaskPoller::new(transport, poll),
        )
    }

    /// Creates a session from existing parts, e.g. a poller shared with
    /// other sessions.
    #[must_use]
    pub fn from_parts(dispatcher: CommandDispatcher, poller: TaskPoller) -> Self {
        Self {
            dispatcher,
            poller,
            scope: CancellationToken::new(),
        }
    }

    /// Returns the poller used by this session.
    #[must_use]
    pub fn poller(&self) -> &TaskPoller {
        &self.poller
    }

    /// Returns a token cancelled when the session closes.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.scope.child_token()
    }

    /// Returns true once [`FleetSession::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Cancels every in-flight operation of this session.
    pub fn close(&self) {
        if !self.scope.is_cancelled() {
            debug!("Closing fleet session");
        }
        self.scope.cancel();
    }

    /// Closes the current scope and opens a fresh one, e.g. when the view
    /// navigates to another page.
    pub fn reset(&mut self) {
        self.close();
        self.scope = CancellationToken::new();
    }

    /// Dispatches `command`, waits for its task and returns the per-unit output.
    ///
    /// # Errors
    ///
    /// Any [`FleetError`] from dispatching, polling or normalizing.
    pub async fn run(
        &self,
        command: &Command,
    ) -> Result<UnitResults<serde_json::Value>, FleetError> {
        let cancel = self.token();
        let mut handle = self.dispatcher.dispatch(command, &cancel).await?;
        let raw = self.poller.await_result(&mut handle, &cancel).await?;
        normalize(raw)
    }

    /// Submits a query, waits for its task and decodes each unit's answer as `P`.
    ///
    /// # Errors
    ///
    /// Any [`FleetError`] from submitting, polling or normalizing.
    pub async fn fetch<P: DeserializeOwned>(
        &self,
        resource: &str,
        target: &UnitTarget,
    ) -> Result<UnitResults<P>, FleetError> {
        let cancel = self.token();
        let mut handle = self.dispatcher.query(resource, target, &cancel).await?;
        let raw = self.poller.await_result(&mut handle, &cancel).await?;
        normalize(raw)
    }

    /// Fetches the available and active resources of `family` from every
    /// unit concurrently and reduces them into a coverage matrix.
    ///
    /// # Errors
    ///
    /// The first error of either fetch; the other fetch is abandoned.
    pub async fn coverage(&self, family: ResourceFamily) -> Result<CoverageMatrix, FleetError> {
        self.coverage_with(&CoverageMatrixBuilder::new(family)).await
    }

    /// Like [`FleetSession::coverage`], reducing with a configured builder.
    ///
    /// # Errors
    ///
    /// The first error of either fetch; the other fetch is abandoned.
    pub async fn coverage_with(
        &self,
        builder: &CoverageMatrixBuilder,
    ) -> Result<CoverageMatrix, FleetError> {
        let family = builder.family();
        let (available, active) = tokio::try_join!(
            self.fetch::<ResourceListing>(family.available_query(), &UnitTarget::Broadcast),
            self.fetch::<ActiveResources>(family.active_query(), &UnitTarget::Broadcast),
        )?;

        let matrix = builder.build(&available, &active);
        info!(
            %family,
            units = matrix.units.len(),
            devices = matrix.devices.len(),
            "Coverage matrix rebuilt"
        );
        Ok(matrix)
    }
}

impl Drop for FleetSession {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
