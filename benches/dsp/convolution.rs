//! Benchmarks for the three convolution strategies.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_room::dsp::convolution::{convolve_direct, convolve_fft, OverlapAdd};

use crate::IR_LENGTHS;

pub fn bench_convolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/convolution");
    group.sample_size(10);

    // One second of audio at 16kHz
    let signal: Vec<f32> = (0..16_000).map(|i| (i as f32 * 0.03).sin() * 0.5).collect();

    for &len in IR_LENGTHS {
        let ir: Vec<f32> = (0..len).map(|i| (-(i as f32) / 400.0).exp()).collect();

        let ola = OverlapAdd::new(&ir).unwrap();
        group.bench_with_input(BenchmarkId::new("overlap_add", len), &len, |b, _| {
            b.iter(|| ola.process(black_box(&signal)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("single_fft", len), &len, |b, _| {
            b.iter(|| convolve_fft(black_box(&ir), black_box(&signal)).unwrap())
        });

        // Quadratic: only the short responses
        if len <= 2048 {
            group.bench_with_input(BenchmarkId::new("direct", len), &len, |b, _| {
                b.iter(|| convolve_direct(black_box(&ir), black_box(&signal)).unwrap())
            });
        }
    }

    group.finish();
}
