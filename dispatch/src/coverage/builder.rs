//! Coverage matrix reduction.
//!
//! The reduction is a pure function of its inputs. Units and categories are
//! collected into ordered sets, so the output never depends on the order in
//! which the fleet returned its keys.

use crate::coverage::types::{CoverageCell, CoverageMatrix, CoverageStatus, ResourceFamily};
use crate::fleet::aggregator::UnitResults;
use crate::fleet::types::{ActiveResources, ResourceListing, UnitName};
use std::collections::{BTreeMap, BTreeSet};

/// Builds a coverage matrix from an "available" and an "active" result.
#[must_use]
pub fn build(
    family: ResourceFamily,
    available: &UnitResults<ResourceListing>,
    active: &UnitResults<ActiveResources>,
) -> CoverageMatrix {
    CoverageMatrixBuilder::new(family).build(available, active)
}

/// Coverage matrix reducer with optional extra sources of units and categories.
///
/// Units known only from the extra source (e.g. the fleet inventory) appear
/// as rows even when neither query mentions them.
#[derive(Debug, Clone)]
pub struct CoverageMatrixBuilder {
    family: ResourceFamily,
    known_units: BTreeSet<UnitName>,
    known_devices: BTreeSet<String>,
}

impl CoverageMatrixBuilder {
    /// Creates a builder for the given family.
    #[must_use]
    pub fn new(family: ResourceFamily) -> Self {
        Self {
            family,
            known_units: BTreeSet::new(),
            known_devices: BTreeSet::new(),
        }
    }

    /// Returns the family this builder reduces.
    #[must_use]
    pub fn family(&self) -> ResourceFamily {
        self.family
    }

    /// Adds units that must appear as rows.
    #[must_use]
    pub fn with_units(mut self, units: impl IntoIterator<Item = UnitName>) -> Self {
        self.known_units.extend(units);
        self
    }

    /// Adds categories that must appear as columns.
    #[must_use]
    pub fn with_devices<S: Into<String>>(mut self, devices: impl IntoIterator<Item = S>) -> Self {
        self.known_devices.extend(devices.into_iter().map(Into::into));
        self
    }

    /// Reduces the two inputs into a dense matrix.
    #[must_use]
    pub fn build(
        &self,
        available: &UnitResults<ResourceListing>,
        active: &UnitResults<ActiveResources>,
    ) -> CoverageMatrix {
        let units: BTreeSet<&UnitName> = available
            .keys()
            .chain(active.keys())
            .chain(self.known_units.iter())
            .collect();

        let devices: BTreeSet<&str> = available
            .values()
            .flat_map(ResourceListing::categories)
            .chain(active.values().flat_map(ActiveResources::categories))
            .chain(self.known_devices.iter().map(String::as_str))
            .collect();

        let cells = units
            .iter()
            .map(|&unit| {
                let row = devices
                    .iter()
                    .map(|&device| {
                        let cell = classify(
                            self.family,
                            unit,
                            device,
                            available.get(unit),
                            active.get(unit),
                        );
                        (device.to_string(), cell)
                    })
                    .collect::<BTreeMap<_, _>>();
                (unit.clone(), row)
            })
            .collect();

        CoverageMatrix {
            family: self.family,
            units: units.into_iter().cloned().collect(),
            devices: devices.into_iter().map(str::to_string).collect(),
            cells,
        }
    }
}

/// Classifies one `(unit, device)` pair.
///
/// Priority: `Active`, then `AvailableNotActive`, then `Missing`, then
/// `Unknown`. `Missing` requires either an explicitly empty listing for the
/// category, or the unit's two answers agreeing on its presence (it answered
/// both queries, or neither). Otherwise a unit that answered exactly one
/// query and has nothing to show is `Unknown`.
fn classify(
    family: ResourceFamily,
    unit: &UnitName,
    device: &str,
    available: Option<&ResourceListing>,
    active: Option<&ActiveResources>,
) -> CoverageCell {
    let route = family.route();

    if let Some(resource) = active.and_then(|a| a.get(device)) {
        let name = resource.name();
        return CoverageCell {
            status: CoverageStatus::Active,
            resource_name: Some(name.to_string()),
            detail_path: Some(format!("{route}/{unit}/{device}/{name}")),
        };
    }

    let listed = available.and_then(|a| a.get(device));
    if listed.is_some_and(|listed| !listed.is_empty()) {
        return CoverageCell {
            status: CoverageStatus::AvailableNotActive,
            resource_name: None,
            detail_path: Some(format!("{route}/{unit}/{device}")),
        };
    }

    // An explicitly empty listing rules out an active resource as well.
    if listed.is_some() || available.is_some() == active.is_some() {
        return CoverageCell {
            status: CoverageStatus::Missing,
            resource_name: None,
            detail_path: Some(format!("{route}/{unit}/{device}/new")),
        };
    }

    CoverageCell {
        status: CoverageStatus::Unknown,
        resource_name: None,
        detail_path: None,
    }
}
