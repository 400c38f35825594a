//! Criterion benchmarks for lane restriction queries.
//!
//! Benchmarks:
//!   - allowed_types on a warm default cache
//!   - allowed_types after the segment cache was dropped
//!   - allowed_types_by_lane on a segment with overrides
//!   - set_allowed edit including node notification
//!
//! Run with: cargo bench -p traffic_core --bench restriction_bench

use bevy::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use traffic_core::network::{
    LaneDirection, LaneInfo, LaneNetwork, LaneType, LaneVehicleTypes, NodeId, SegmentId,
    SegmentInfo, ServiceClass,
};
use traffic_core::restrictions::{LaneRestrictions, NodeInvalidations};
use traffic_core::{DrivingSide, VehicleTypes};

const SEGMENTS: usize = 1024;

fn avenue() -> SegmentInfo {
    let car = |direction| LaneInfo::new(LaneVehicleTypes::CAR, direction);
    SegmentInfo::new(
        ServiceClass::Road,
        vec![
            car(LaneDirection::Forward),
            car(LaneDirection::Forward)
                .with_lane_type(LaneType::VEHICLE | LaneType::TRANSPORT_VEHICLE),
            LaneInfo::new(LaneVehicleTypes::BICYCLE, LaneDirection::Forward),
            car(LaneDirection::Backward),
            car(LaneDirection::Backward)
                .with_lane_type(LaneType::VEHICLE | LaneType::TRANSPORT_VEHICLE),
            LaneInfo::new(LaneVehicleTypes::BICYCLE, LaneDirection::Backward),
        ],
    )
}

/// A straight street of `SEGMENTS` avenue segments.
fn street() -> (LaneNetwork, Vec<(SegmentId, NodeId)>) {
    let mut network = LaneNetwork::default();
    let mut previous = network.add_node(Vec3::ZERO);
    let mut segments = Vec::with_capacity(SEGMENTS);
    for i in 1..=SEGMENTS {
        let next = network.add_node(Vec3::new(i as f32 * 64.0, 0.0, 0.0));
        segments.push((network.add_segment(previous, next, avenue()), next));
        previous = next;
    }
    (network, segments)
}

// ---------------------------------------------------------------------------
// Benchmark: queries
// ---------------------------------------------------------------------------

fn bench_allowed_types(c: &mut Criterion) {
    let mut group = c.benchmark_group("restriction_allowed_types");
    let (network, segments) = street();
    let mut restrictions = LaneRestrictions::default();

    group.bench_function("warm_cache_full_street", |b| {
        b.iter(|| {
            for &(segment, node) in &segments {
                black_box(restrictions.allowed_types(
                    &network,
                    DrivingSide::RightHand,
                    black_box(segment),
                    node,
                ));
            }
        });
    });

    let (segment, node) = segments[SEGMENTS / 2];
    group.bench_function("cold_cache_single_segment", |b| {
        b.iter(|| {
            restrictions.clear_cache(segment);
            black_box(restrictions.allowed_types(&network, DrivingSide::RightHand, segment, node))
        });
    });

    group.finish();
}

fn bench_by_lane_with_overrides(c: &mut Criterion) {
    let mut group = c.benchmark_group("restriction_by_lane");
    let (network, segments) = street();
    let mut restrictions = LaneRestrictions::default();
    let mut invalidations = NodeInvalidations::default();

    for &(segment, _) in &segments {
        if let Some(lane) = network.lane_at(segment, 0) {
            restrictions.set_allowed(
                &network,
                &mut invalidations,
                segment,
                0,
                lane,
                VehicleTypes::ROAD_PUBLIC_TRANSPORT,
            );
        }
    }

    let (segment, node) = segments[7];
    group.bench_function("overridden_segment", |b| {
        b.iter(|| {
            black_box(restrictions.allowed_types_by_lane(
                &network,
                DrivingSide::LeftHand,
                black_box(segment),
                node,
            ))
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: edits
// ---------------------------------------------------------------------------

fn bench_set_allowed(c: &mut Criterion) {
    let mut group = c.benchmark_group("restriction_edit");
    let (network, segments) = street();
    let mut restrictions = LaneRestrictions::default();
    let mut invalidations = NodeInvalidations::default();
    let (segment, _) = segments[3];
    let Some(lane) = network.lane_at(segment, 3) else {
        return;
    };

    group.bench_function("set_allowed", |b| {
        b.iter(|| {
            black_box(restrictions.set_allowed(
                &network,
                &mut invalidations,
                segment,
                3,
                lane,
                black_box(VehicleTypes::ROAD_VEHICLE & !VehicleTypes::CARGO_TRUCK),
            ))
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Register groups
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_allowed_types,
    bench_by_lane_with_overrides,
    bench_set_allowed
);
criterion_main!(benches);
