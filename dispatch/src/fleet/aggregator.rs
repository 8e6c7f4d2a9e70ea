//! Normalization of polled fleet results.
//!
//! The payload type is chosen by the caller: a calibration listing query
//! normalizes into `UnitResults<ResourceListing>`, an active-calibration
//! query into `UnitResults<ActiveResources>`, and opaque command output into
//! `UnitResults<serde_json::Value>`.

use crate::fleet::types::{FleetError, RawFleetResult, TaskStatus, UnitName};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::warn;

/// Per-unit answers of a completed task, keyed by unit.
///
/// A unit that never answered has no entry; a unit that answered with an
/// empty payload has an entry with an empty payload.
pub type UnitResults<P> = BTreeMap<UnitName, P>;

/// Normalizes a terminal task result into typed per-unit payloads.
///
/// Keys that are not valid unit names are dropped, as are units whose
/// payload does not decode as `P`. No unit is ever added.
///
/// # Errors
///
/// - `TaskFailed` if the task reported an error
/// - `MalformedResponse` if a complete task's result is not a mapping
///
/// # Panics
///
/// Panics if `raw` is still pending: results must only be normalized after
/// the poller has seen a terminal status.
pub fn normalize<P: DeserializeOwned>(raw: RawFleetResult) -> Result<UnitResults<P>, FleetError> {
    match raw.status {
        TaskStatus::Pending => {
            panic!("normalize called on a pending task result; await the task first")
        }
        TaskStatus::Error => Err(FleetError::TaskFailed(raw.failure_message())),
        TaskStatus::Complete => {
            let Some(serde_json::Value::Object(entries)) = raw.result else {
                return Err(FleetError::MalformedResponse(
                    "Completed task result is not a unit mapping".to_string(),
                ));
            };

            let mut normalized = BTreeMap::new();
            for (key, payload) in entries {
                let Ok(unit) = UnitName::new(&key) else {
                    warn!(key = %key, "Dropping result entry with invalid unit name");
                    continue;
                };
                match serde_json::from_value::<P>(payload) {
                    Ok(decoded) => {
                        normalized.insert(unit, decoded);
                    }
                    Err(e) => {
                        warn!(%unit, error = %e, "Dropping undecodable unit payload");
                    }
                }
            }
            Ok(normalized)
        }
    }
}
