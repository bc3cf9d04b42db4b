//! Benchmarks for image-source impulse responses.
//!
//! Cost grows with the cube of the response length over the room size, so
//! small reflective rooms at the sample cap are the worst case.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use glam::Vec3;
use saavy_room::rir::{self, RirParams};
use saavy_room::room::{CoefficientKind, Dimensions, Room, SurfaceCoefficients};

use crate::IR_LENGTHS;

pub fn bench_rir(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/rir");
    group.sample_size(10);

    let room = Room::new(
        Dimensions::new(4.0, 5.0, 3.0),
        SurfaceCoefficients::uniform(0.9, CoefficientKind::Reflection),
    );
    let source = Vec3::new(1.0, 1.0, 1.5);
    let receiver = Vec3::new(3.0, 4.0, 1.5);

    for &len in IR_LENGTHS {
        let params = RirParams::new(source, receiver, room, len);
        group.bench_with_input(BenchmarkId::new("unbounded", len), &len, |b, _| {
            b.iter(|| rir::generate(black_box(&params)).unwrap())
        });

        let params = params.clone().reflection_order(Some(10));
        group.bench_with_input(BenchmarkId::new("order_10", len), &len, |b, _| {
            b.iter(|| rir::generate(black_box(&params)).unwrap())
        });
    }

    group.finish();
}
