//! Fleet Dispatch - command dispatch and result aggregation for a device fleet.
//!
//! This crate issues commands to one unit or to every unit of a fleet of
//! lab-automation devices, follows the resulting asynchronous tasks through
//! the fleet's polling protocol, and reconciles the partial per-unit answers
//! into typed results and coverage matrices.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Unit x category coverage reconciliation.
pub mod coverage;
/// Dispatching, polling and normalizing fleet tasks.
pub mod fleet;
/// Infrastructure components (config, telemetry).
pub mod infrastructure;
/// Per-view session state and cancellation scope.
pub mod session;
