//! Shared test utilities for integration tests.
//!
//! Provides a mock fleet leader that answers broadcast queries with tasks
//! whose status endpoints can be scripted per resource.

#![allow(dead_code)]

use anyhow::Result;
use fleet_dispatch::fleet::{HttpTransport, HttpTransportConfig, PollConfig};
use fleet_dispatch::session::FleetSession;
use reqwest::Url;
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock fleet leader.
pub struct MockFleet {
    /// Underlying HTTP server
    pub server: MockServer,
}

impl MockFleet {
    /// Starts an empty mock leader.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Returns the status endpoint path of the task started by `resource`.
    pub fn task_path(resource: &str) -> String {
        format!("/unit_api/task_results/{resource}")
    }

    /// Accepts `GET api/units/$broadcast/{resource}` and starts its task.
    pub async fn accept_query(&self, resource: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/api/units/$broadcast/{resource}")))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "unit": "$broadcast",
                "task_id": resource,
                "result_url_path": Self::task_path(resource),
            })))
            .mount(&self.server)
            .await;
    }

    /// Makes the task of `resource` report `pending` `times` times first.
    pub async fn pending_for(&self, resource: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path(Self::task_path(resource)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "pending", "result": null })),
            )
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    /// Makes the task of `resource` complete with `result`.
    pub async fn complete_with(&self, resource: &str, result: Value) {
        Mock::given(method("GET"))
            .and(path(Self::task_path(resource)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "complete", "result": result })),
            )
            .mount(&self.server)
            .await;
    }

    /// Makes the task of `resource` fail with `error`.
    pub async fn fail_with(&self, resource: &str, error: &str) {
        Mock::given(method("GET"))
            .and(path(Self::task_path(resource)))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({ "status": "error", "result": null, "error": error }),
            ))
            .mount(&self.server)
            .await;
    }

    /// Accepts a broadcast query whose task completes with `result`.
    pub async fn answer(&self, resource: &str, result: Value) {
        self.accept_query(resource).await;
        self.complete_with(resource, result).await;
    }

    /// Counts status requests received for the task of `resource`.
    pub async fn status_requests(&self, resource: &str) -> usize {
        let task_path = Self::task_path(resource);
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == task_path)
            .count()
    }

    /// Creates a session against this leader.
    pub fn session(&self, poll: PollConfig) -> Result<FleetSession> {
        let base = Url::parse(&format!("{}/", self.server.uri()))?;
        let transport = HttpTransport::new(HttpTransportConfig::new(base))?;
        Ok(FleetSession::new(Arc::new(transport), poll))
    }
}

/// Poll configuration fast enough for real-time tests.
pub fn fast_polling() -> PollConfig {
    PollConfig::new().with_interval_ms(20)
}
