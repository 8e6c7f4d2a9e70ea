//! Benchmarks for the coverage matrix reducer in dispatch/src/coverage.
//!
//! Performance-critical paths:
//! - `build`: union of units and devices plus per-cell classification
//! - `CoverageMatrix::status_counts`: summary over a dense matrix

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fleet_dispatch::coverage::{CoverageMatrixBuilder, ResourceFamily, build};
use fleet_dispatch::fleet::{
    ActiveResources, ResourceListing, ResourceRef, UnitName, UnitResults,
};

const DEVICES: [&str; 6] = ["od", "stirring", "media_pump", "waste_pump", "alt_media_pump", "temp"];

fn unit(i: usize) -> UnitName {
    UnitName::new(&format!("unit{i:03}")).unwrap_or_else(|e| panic!("invalid unit name: {e}"))
}

/// Builds a fleet where every third unit has an active resource, every
/// other unit lists one, and the rest answered empty.
fn fleet(units: usize) -> (UnitResults<ResourceListing>, UnitResults<ActiveResources>) {
    let mut available = UnitResults::new();
    let mut active = UnitResults::new();

    for i in 0..units {
        let listing: ResourceListing = DEVICES
            .iter()
            .enumerate()
            .map(|(d, device)| {
                let names = if (i + d) % 2 == 0 {
                    vec![ResourceRef::from(format!("{device}-cal").as_str())]
                } else {
                    Vec::new()
                };
                (*device, names)
            })
            .collect();
        let actives: ActiveResources = DEVICES
            .iter()
            .enumerate()
            .map(|(d, device)| {
                let name = ((i + d) % 3 == 0)
                    .then(|| ResourceRef::from(format!("{device}-cal").as_str()));
                (*device, name)
            })
            .collect();

        available.insert(unit(i), listing);
        if i % 5 != 4 {
            active.insert(unit(i), actives);
        }
    }

    (available, active)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("coverage/build");

    for units in [4_usize, 32, 256] {
        let (available, active) = fleet(units);
        group.throughput(Throughput::Elements((units * DEVICES.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(units), &units, |b, _| {
            b.iter(|| {
                build(
                    ResourceFamily::Calibrations,
                    black_box(&available),
                    black_box(&active),
                )
            });
        });
    }

    group.finish();
}

fn bench_build_with_inventory(c: &mut Criterion) {
    let mut group = c.benchmark_group("coverage/build_with_inventory");

    let (available, active) = fleet(32);
    let builder = CoverageMatrixBuilder::new(ResourceFamily::Estimators)
        .with_units((32..64).map(unit))
        .with_devices(["pwm", "heater"]);

    group.bench_function("32_answered_32_silent", |b| {
        b.iter(|| builder.build(black_box(&available), black_box(&active)));
    });

    group.finish();
}

fn bench_status_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("coverage/status_counts");

    let (available, active) = fleet(256);
    let matrix = build(ResourceFamily::Calibrations, &available, &active);

    group.bench_function("256_units", |b| {
        b.iter(|| black_box(&matrix).status_counts());
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_build_with_inventory, bench_status_counts);
criterion_main!(benches);
