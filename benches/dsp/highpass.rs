//! Benchmarks for the impulse response high-pass filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_room::rir::HighPass;

use crate::IR_LENGTHS;

pub fn bench_highpass(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/highpass");

    for &len in IR_LENGTHS {
        let input: Vec<f32> = (0..len).map(|i| (-(i as f32) / 300.0).exp()).collect();
        let mut filter = HighPass::new(16_000.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("render", len), &len, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
