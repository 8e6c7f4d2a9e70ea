//! Shared poll loops.
//!
//! Each result location has at most one running loop per poller. Callers
//! join the loop as waiters and receive its outcome through a `watch`
//! channel. A waiter leaves when it is cancelled or its future is dropped;
//! when the last waiter leaves, the loop is stopped before its next request.

use crate::fleet::poller::config::PollConfig;
use crate::fleet::transport::{FleetTransport, TransportError};
use crate::fleet::types::{
    FleetError, RawFleetResult, ResultLocation, TaskHandle, TaskState, TaskStatus,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type PollOutcome = Result<RawFleetResult, FleetError>;

struct SharedLoop {
    id: u64,
    outcome: watch::Receiver<Option<PollOutcome>>,
    stop: CancellationToken,
    waiters: usize,
}

struct PollerInner {
    transport: Arc<dyn FleetTransport>,
    config: PollConfig,
    loops: Mutex<HashMap<ResultLocation, SharedLoop>>,
    next_loop_id: AtomicU64,
}

impl PollerInner {
    fn finish(&self, location: &ResultLocation, id: u64) {
        let mut loops = self.loops.lock();
        if loops.get(location).is_some_and(|shared| shared.id == id) {
            loops.remove(location);
        }
    }
}

/// Follows pending tasks until they reach a terminal status.
///
/// Cloning a `TaskPoller` is cheap; clones share the same loop table, so a
/// task awaited through any clone is polled by a single loop.
#[derive(Clone)]
pub struct TaskPoller {
    inner: Arc<PollerInner>,
}

impl TaskPoller {
    /// Creates a poller over the given transport.
    pub fn new(transport: Arc<dyn FleetTransport>, config: PollConfig) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                transport,
                config,
                loops: Mutex::new(HashMap::new()),
                next_loop_id: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the poll configuration.
    #[must_use]
    pub fn config(&self) -> &PollConfig {
        &self.inner.config
    }

    /// Returns the number of poll loops currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.loops.lock().len()
    }

    /// Waits for `handle` to reach a terminal status and returns the final
    /// status payload.
    ///
    /// Concurrent calls for the same result location share one poll loop.
    /// The handle is moved to `Complete` or `Failed` when the task settles.
    ///
    /// # Errors
    ///
    /// - `TaskFailed` if the task reports an `error` status
    /// - `PollTimeout` if `max_attempts` requests all reported `pending`
    /// - `PollFailed` if a status request fails or returns an unparseable body
    /// - `Cancelled` if `cancel` fires first; other callers sharing the loop
    ///   are unaffected
    /// - `InvalidRequest` if the handle has already settled
    pub async fn await_result(
        &self,
        handle: &mut TaskHandle,
        cancel: &CancellationToken,
    ) -> Result<RawFleetResult, FleetError> {
        if handle.state().is_terminal() {
            return Err(FleetError::InvalidRequest(format!(
                "Task at {} has already settled",
                handle.result_location()
            )));
        }
        if cancel.is_cancelled() {
            return Err(FleetError::Cancelled);
        }

        let (mut outcome, _waiter) = self.join(handle.result_location());

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(location = %handle.result_location(), "Waiter cancelled");
                Err(FleetError::Cancelled)
            }
            res = wait_for_outcome(&mut outcome) => res,
        };

        match &result {
            Ok(_) => {
                handle.settle(TaskState::Complete);
            }
            Err(FleetError::TaskFailed(_)) => {
                handle.settle(TaskState::Failed);
            }
            Err(_) => {}
        }
        result
    }

    /// Joins the loop for `location`, starting one if none is running.
    fn join(&self, location: &ResultLocation) -> (watch::Receiver<Option<PollOutcome>>, Waiter) {
        let mut loops = self.inner.loops.lock();

        if let Some(shared) = loops.get_mut(location) {
            shared.waiters += 1;
            debug!(%location, waiters = shared.waiters, "Joining in-flight poll loop");
            let waiter = Waiter {
                inner: Arc::clone(&self.inner),
                location: location.clone(),
                loop_id: shared.id,
            };
            return (shared.outcome.clone(), waiter);
        }

        let id = self.inner.next_loop_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        let stop = CancellationToken::new();
        loops.insert(
            location.clone(),
            SharedLoop {
                id,
                outcome: rx.clone(),
                stop: stop.clone(),
                waiters: 1,
            },
        );
        drop(loops);

        debug!(%location, loop_id = id, "Starting poll loop");
        let inner = Arc::clone(&self.inner);
        let loop_location = location.clone();
        tokio::spawn(async move {
            let outcome = run_loop(
                inner.transport.as_ref(),
                &inner.config,
                &loop_location,
                &stop,
            )
            .await;
            tx.send_replace(Some(outcome));
            inner.finish(&loop_location, id);
        });

        let waiter = Waiter {
            inner: Arc::clone(&self.inner),
            location: location.clone(),
            loop_id: id,
        };
        (rx, waiter)
    }
}

/// Membership of one caller in a shared loop; leaving happens on drop.
struct Waiter {
    inner: Arc<PollerInner>,
    location: ResultLocation,
    loop_id: u64,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        let mut loops = self.inner.loops.lock();
        let Some(shared) = loops.get_mut(&self.location) else {
            return;
        };
        if shared.id != self.loop_id {
            return;
        }
        shared.waiters = shared.waiters.saturating_sub(1);
        if shared.waiters == 0 {
            shared.stop.cancel();
            loops.remove(&self.location);
            debug!(location = %self.location, "Last waiter left, poll loop stopped");
        }
    }
}

async fn wait_for_outcome(rx: &mut watch::Receiver<Option<PollOutcome>>) -> PollOutcome {
    match rx.wait_for(Option::is_some).await {
        Ok(value) => (*value).clone().unwrap_or(Err(FleetError::Cancelled)),
        Err(_) => Err(FleetError::PollFailed {
            status: None,
            body: "poll loop ended without a result".to_string(),
        }),
    }
}

/// Issues strictly sequential status requests until a terminal status.
async fn run_loop(
    transport: &dyn FleetTransport,
    config: &PollConfig,
    location: &ResultLocation,
    stop: &CancellationToken,
) -> PollOutcome {
    let mut attempts: u32 = 0;
    loop {
        attempts = attempts.saturating_add(1);
        debug!(%location, attempt = attempts, "Polling task status");

        let sent = tokio::select! {
            biased;
            () = stop.cancelled() => return Err(FleetError::Cancelled),
            res = transport.get(location.as_str()) => res,
        };
        let response = sent.map_err(|e| match e {
            TransportError::InvalidUrl(msg) => FleetError::Config(msg),
            TransportError::Network(body) => FleetError::PollFailed { status: None, body },
        })?;
        if !response.is_success() {
            warn!(%location, status = response.status, "Status request rejected");
            return Err(FleetError::PollFailed {
                status: Some(response.status),
                body: response.body,
            });
        }
        let raw: RawFleetResult =
            serde_json::from_str(&response.body).map_err(|e| FleetError::PollFailed {
                status: Some(response.status),
                body: format!("Parse error: {e}"),
            })?;

        match raw.status {
            TaskStatus::Complete => {
                info!(%location, attempts, "Task complete");
                return Ok(raw);
            }
            TaskStatus::Error => {
                let message = raw.failure_message();
                warn!(%location, attempts, error = %message, "Task failed");
                return Err(FleetError::TaskFailed(message));
            }
            TaskStatus::Pending => {}
        }

        if config.is_exhausted(attempts) {
            warn!(%location, attempts, "Attempt budget exhausted while task pending");
            return Err(FleetError::PollTimeout { attempts });
        }

        tokio::select! {
            biased;
            () = stop.cancelled() => return Err(FleetError::Cancelled),
            () = tokio::time::sleep(config.interval()) => {}
        }
    }
}
