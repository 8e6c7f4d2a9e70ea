//! Poll loop tests against a scripted transport.
//!
//! Runs on a paused clock so that poll intervals elapse instantly and the
//! number of status requests can be asserted exactly.

use async_trait::async_trait;
use fleet_dispatch::fleet::transport::TransportError;
use fleet_dispatch::fleet::{
    FleetError, FleetTransport, PollConfig, ResultLocation, TaskHandle, TaskPoller, TaskState,
    TransportResponse,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Transport replaying scripted status responses, then `fallback` forever.
struct ScriptedTransport {
    script: Mutex<VecDeque<TransportResponse>>,
    fallback: TransportResponse,
    calls: watch::Sender<usize>,
}

impl ScriptedTransport {
    fn new(script: Vec<serde_json::Value>, fallback: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|body| TransportResponse::new(200, body.to_string()))
                    .collect(),
            ),
            fallback: TransportResponse::new(200, fallback.to_string()),
            calls: watch::channel(0).0,
        })
    }

    fn pending_forever() -> Arc<Self> {
        Self::new(Vec::new(), pending())
    }

    fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.calls.subscribe();
        let _ = rx.wait_for(|calls| *calls >= n).await;
    }
}

#[async_trait]
impl FleetTransport for ScriptedTransport {
    async fn post(
        &self,
        _path: &str,
        _body: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError> {
        Err(TransportError::Network("post not scripted".to_string()))
    }

    async fn get(&self, _path: &str) -> Result<TransportResponse, TransportError> {
        self.calls.send_modify(|calls| *calls += 1);
        let next = self.script.lock().pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }
}

fn pending() -> serde_json::Value {
    json!({ "status": "pending", "result": null })
}

fn complete(result: serde_json::Value) -> serde_json::Value {
    json!({ "status": "complete", "result": result })
}

fn handle(location: &str) -> TaskHandle {
    TaskHandle::new(ResultLocation::new(location).unwrap())
}

fn poller(transport: &Arc<ScriptedTransport>) -> TaskPoller {
    TaskPoller::new(transport.clone(), PollConfig::new().with_interval_ms(1_000))
}

// =============================================================================
// Sequential Polling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_fourth_payload_wins_after_three_pending() {
    let transport = ScriptedTransport::new(
        vec![
            pending(),
            pending(),
            pending(),
            complete(json!({ "unit1": "fourth" })),
        ],
        complete(json!({ "unit1": "fifth" })),
    );
    let poller = poller(&transport);
    let mut handle = handle("/unit_api/task_results/a");

    let raw = poller
        .await_result(&mut handle, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(transport.calls(), 4);
    assert_eq!(raw.result, Some(json!({ "unit1": "fourth" })));
    assert_eq!(handle.state(), TaskState::Complete);
}

#[tokio::test(start_paused = true)]
async fn test_requests_are_spaced_by_interval() {
    let transport = ScriptedTransport::new(vec![pending(), pending()], complete(json!({})));
    let poller = poller(&transport);
    let mut handle = handle("/unit_api/task_results/b");

    let start = tokio::time::Instant::now();
    poller
        .await_result(&mut handle, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(transport.calls(), 3);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(2_000));
    assert!(elapsed < Duration::from_millis(3_000));
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_after_second_request_stops_polling() {
    let transport = ScriptedTransport::pending_forever();
    let poller = poller(&transport);
    let cancel = CancellationToken::new();

    let task = {
        let poller = poller.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut handle = handle("/unit_api/task_results/c");
            let result = poller.await_result(&mut handle, &cancel).await;
            (result, handle)
        })
    };

    transport.wait_for_calls(2).await;
    cancel.cancel();
    let (result, handle) = task.await.unwrap();

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(result, Err(FleetError::Cancelled));
    assert_eq!(handle.state(), TaskState::Pending);
    assert_eq!(transport.calls(), 2);
    assert_eq!(poller.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_waiter_stops_polling() {
    let transport = ScriptedTransport::pending_forever();
    let poller = poller(&transport);

    let task = {
        let poller = poller.clone();
        tokio::spawn(async move {
            let mut handle = handle("/unit_api/task_results/d");
            poller
                .await_result(&mut handle, &CancellationToken::new())
                .await
        })
    };

    transport.wait_for_calls(1).await;
    task.abort();
    let _ = task.await;

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(transport.calls(), 1);
    assert_eq!(poller.in_flight(), 0);
}

// =============================================================================
// Shared Loops
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_concurrent_waiters_share_one_loop() {
    let transport =
        ScriptedTransport::new(vec![pending(), pending()], complete(json!({ "unit1": 7 })));
    let poller = poller(&transport);
    let cancel = CancellationToken::new();

    let mut first = handle("/unit_api/task_results/e");
    let mut second = handle("/unit_api/task_results/e");
    let (a, b) = tokio::join!(
        poller.await_result(&mut first, &cancel),
        poller.await_result(&mut second, &cancel),
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(transport.calls(), 3);
    assert_eq!(first.state(), TaskState::Complete);
    assert_eq!(second.state(), TaskState::Complete);
}

#[tokio::test(start_paused = true)]
async fn test_one_waiter_cancelling_leaves_the_other_running() {
    let transport = ScriptedTransport::new(
        vec![pending(), pending(), pending()],
        complete(json!({ "unit1": "done" })),
    );
    let poller = poller(&transport);
    let leaving = CancellationToken::new();
    let staying = CancellationToken::new();

    let spawn_waiter = |cancel: CancellationToken| {
        let poller = poller.clone();
        tokio::spawn(async move {
            let mut handle = handle("/unit_api/task_results/f");
            poller.await_result(&mut handle, &cancel).await
        })
    };
    let left = spawn_waiter(leaving.clone());
    let stayed = spawn_waiter(staying.clone());

    transport.wait_for_calls(1).await;
    leaving.cancel();

    assert_eq!(left.await.unwrap(), Err(FleetError::Cancelled));
    let raw = stayed.await.unwrap().unwrap();
    assert_eq!(raw.result, Some(json!({ "unit1": "done" })));
    assert_eq!(transport.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_all_waiters_cancelling_stops_shared_loop() {
    let transport = ScriptedTransport::pending_forever();
    let poller = poller(&transport);
    let cancel = CancellationToken::new();

    let spawn_waiter = || {
        let poller = poller.clone();
        let cancel = cancel.child_token();
        tokio::spawn(async move {
            let mut handle = handle("/unit_api/task_results/g");
            poller.await_result(&mut handle, &cancel).await
        })
    };
    let waiters = [spawn_waiter(), spawn_waiter(), spawn_waiter()];

    transport.wait_for_calls(2).await;
    assert_eq!(poller.in_flight(), 1);
    cancel.cancel();
    for waiter in waiters {
        assert_eq!(waiter.await.unwrap(), Err(FleetError::Cancelled));
    }

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.calls(), 2);
    assert_eq!(poller.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_distinct_locations_poll_independently() {
    let transport = ScriptedTransport::new(Vec::new(), complete(json!({})));
    let poller = poller(&transport);
    let cancel = CancellationToken::new();

    let mut first = handle("/unit_api/task_results/h1");
    let mut second = handle("/unit_api/task_results/h2");
    let (a, b) = tokio::join!(
        poller.await_result(&mut first, &cancel),
        poller.await_result(&mut second, &cancel),
    );

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_settled_handle_is_not_polled_again() {
    let transport = ScriptedTransport::new(Vec::new(), complete(json!({})));
    let poller = poller(&transport);
    let cancel = CancellationToken::new();
    let mut handle = handle("/unit_api/task_results/i");

    poller.await_result(&mut handle, &cancel).await.unwrap();
    let again = poller.await_result(&mut handle, &cancel).await;

    assert!(matches!(again, Err(FleetError::InvalidRequest(_))));
    assert_eq!(transport.calls(), 1);
}
