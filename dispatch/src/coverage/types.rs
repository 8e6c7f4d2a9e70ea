//! Coverage matrix types.

use crate::fleet::types::UnitName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The kind of resource a coverage matrix summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFamily {
    /// Device calibrations.
    Calibrations,
    /// Model estimators.
    Estimators,
}

impl ResourceFamily {
    /// Query listing every available resource per unit and category.
    #[must_use]
    pub const fn available_query(self) -> &'static str {
        match self {
            Self::Calibrations => "calibrations",
            Self::Estimators => "estimators",
        }
    }

    /// Query naming the active resource per unit and category.
    #[must_use]
    pub const fn active_query(self) -> &'static str {
        match self {
            Self::Calibrations => "active_calibrations",
            Self::Estimators => "active_estimators",
        }
    }

    /// Root of the navigable detail references for this family.
    #[must_use]
    pub const fn route(self) -> &'static str {
        match self {
            Self::Calibrations => "/calibrations",
            Self::Estimators => "/estimators",
        }
    }
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.available_query())
    }
}

impl FromStr for ResourceFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calibrations" => Ok(Self::Calibrations),
            "estimators" => Ok(Self::Estimators),
            other => Err(format!("unknown resource family '{other}'")),
        }
    }
}

/// Classification of one coverage cell, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageStatus {
    /// A specific resource is active for this unit and category.
    Active,
    /// Resources exist, none is active.
    AvailableNotActive,
    /// Nothing has ever been recorded for this unit and category.
    Missing,
    /// The unit did not answer one of the two queries.
    Unknown,
}

/// What a view may offer for a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAction {
    /// Navigate to the resource or listing at the detail path.
    View,
    /// Create a resource at the detail path.
    Create,
    /// Nothing can be offered: the data is missing.
    None,
}

/// One cell of a [`CoverageMatrix`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCell {
    /// Classification.
    pub status: CoverageStatus,
    /// Name of the active resource; only set for `Active`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    /// Navigable reference: the resource, the listing, or the create form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_path: Option<String>,
}

impl CoverageCell {
    /// Returns what a view may offer for this cell.
    #[must_use]
    pub fn action(&self) -> CellAction {
        match (self.status, &self.detail_path) {
            (CoverageStatus::Active | CoverageStatus::AvailableNotActive, Some(_)) => {
                CellAction::View
            }
            (CoverageStatus::Missing, Some(_)) => CellAction::Create,
            _ => CellAction::None,
        }
    }
}

/// Dense unit x category status matrix.
///
/// `cells[u][d]` exists for every `u` in `units` and `d` in `devices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageMatrix {
    /// Resource family summarized.
    pub family: ResourceFamily,
    /// Units, sorted.
    pub units: Vec<UnitName>,
    /// Categories, sorted.
    pub devices: Vec<String>,
    /// Cells by unit, then category.
    pub cells: BTreeMap<UnitName, BTreeMap<String, CoverageCell>>,
}

impl CoverageMatrix {
    /// Returns the cell for `unit` and `device`.
    #[must_use]
    pub fn cell(&self, unit: &UnitName, device: &str) -> Option<&CoverageCell> {
        self.cells.get(unit).and_then(|row| row.get(device))
    }

    /// Returns true if every `(unit, device)` pair has exactly one cell and
    /// no cell exists outside `units x devices`.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        self.cells.len() == self.units.len()
            && self.units.iter().all(|unit| {
                self.cells.get(unit).is_some_and(|row| {
                    row.len() == self.devices.len()
                        && self.devices.iter().all(|d| row.contains_key(d))
                })
            })
    }

    /// Counts cells per status.
    #[must_use]
    pub fn status_counts(&self) -> BTreeMap<CoverageStatus, usize> {
        let mut counts = BTreeMap::new();
        for cell in self.cells.values().flat_map(BTreeMap::values) {
            *counts.entry(cell.status).or_insert(0) += 1;
        }
        counts
    }
}
