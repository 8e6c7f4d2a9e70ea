//! Task status polling.
//!
//! This module provides the [`TaskPoller`], which follows pending tasks until
//! they reach a terminal status, sharing one poll loop between every caller
//! awaiting the same task.

pub mod config;
pub mod core;

pub use config::{PollConfig, DEFAULT_POLL_INTERVAL_MS};
pub use self::core::TaskPoller;
