//! Type definitions for fleet operations.
//!
//! This module contains the value types shared by the dispatcher, the poller
//! and the aggregator.

pub mod error;
pub mod payload;
pub mod task;
pub mod unit;

// Re-export all types for convenience
pub use error::FleetError;
pub use payload::{ActiveResources, CommandArg, ResourceDescriptor, ResourceListing, ResourceRef};
pub use task::{RawFleetResult, ResultLocation, TaskHandle, TaskState, TaskStatus};
pub use unit::{UnitName, UnitNameError, UnitTarget, BROADCAST_SENTINEL};
