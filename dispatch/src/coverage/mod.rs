//! Coverage matrices.
//!
//! A coverage matrix summarizes, for every unit and every resource category
//! (device), whether a resource is active, merely available, absent, or
//! unknown because the unit did not answer one of the underlying queries.

pub mod builder;
pub mod types;

pub use builder::{build, CoverageMatrixBuilder};
pub use types::{CellAction, CoverageCell, CoverageMatrix, CoverageStatus, ResourceFamily};
