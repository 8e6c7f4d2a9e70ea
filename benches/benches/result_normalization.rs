//! Benchmarks for result normalization in dispatch/src/fleet/aggregator.rs
//!
//! Performance-critical paths:
//! - `normalize`: validating unit keys and decoding typed per-unit payloads

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fleet_dispatch::fleet::{ActiveResources, RawFleetResult, ResourceListing, normalize};
use serde_json::{Map, Value, json};

fn raw_result(units: usize) -> RawFleetResult {
    let result: Map<String, Value> = (0..units)
        .map(|i| {
            (
                format!("unit{i:03}"),
                json!({
                    "od": ["od-a", "od-b"],
                    "stirring": [{
                        "calibration_name": "stir-1",
                        "created_at": "2025-01-01T00:00:00Z"
                    }],
                    "media_pump": [],
                }),
            )
        })
        .collect();

    let raw = json!({ "status": "complete", "result": Value::Object(result) });
    serde_json::from_value(raw).unwrap_or_else(|e| panic!("invalid fixture: {e}"))
}

fn bench_normalize_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize/listing");

    for units in [8_usize, 64, 512] {
        let raw = raw_result(units);
        group.throughput(Throughput::Elements(units as u64));
        group.bench_with_input(BenchmarkId::from_parameter(units), &raw, |b, raw| {
            b.iter(|| normalize::<ResourceListing>(black_box(raw.clone())));
        });
    }

    group.finish();
}

fn bench_normalize_mismatched_shape(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize/mismatched_shape");

    // Listings decoded as active resources: every unit is dropped.
    let raw = raw_result(64);
    group.bench_function("64_units_dropped", |b| {
        b.iter(|| normalize::<ActiveResources>(black_box(raw.clone())));
    });

    group.finish();
}

criterion_group!(benches, bench_normalize_listing, bench_normalize_mismatched_shape);
criterion_main!(benches);
