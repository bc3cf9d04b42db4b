//! Benchmarks for the radix-2 FFT against rustfft.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rustfft::{num_complex::Complex, FftPlanner};
use saavy_room::dsp::Radix2Fft;

pub fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/fft");

    for &size in &[256usize, 2048, 16_384] {
        let input: Vec<Complex<f32>> = (0..size)
            .map(|i| Complex::new((i as f32 * 0.01).sin(), 0.0))
            .collect();

        let fft = Radix2Fft::new(size);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("radix2", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                fft.forward(black_box(&mut buffer));
            })
        });

        let planned = FftPlanner::new().plan_fft_forward(size);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("rustfft", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                planned.process(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
