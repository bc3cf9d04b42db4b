//! Benchmarks for the audio-thread renderer.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use saavy_room::playback::{renderer, PlaybackBuffer, PlaybackSink};
use saavy_room::SourceId;

use crate::BLOCK_SIZES;

pub fn bench_playback(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/playback");

    for &size in BLOCK_SIZES {
        // 8 looping sources, stereo device
        let (mut sink, mut renderer) = renderer::channel(64, 8);
        for i in 0..8 {
            let samples: Vec<f32> = (0..48_000).map(|n| ((n + i * 100) as f32 * 0.01).sin()).collect();
            let buffer = Arc::new(PlaybackBuffer::new(samples, 1, 48_000, Some(1)));
            sink.play(SourceId(i as u64), buffer, 0, 0).unwrap();
        }

        let mut out = vec![0.0f32; size * 2];
        group.bench_with_input(BenchmarkId::new("8_sources", size), &size, |b, _| {
            b.iter(|| renderer.render_block(black_box(&mut out), 2))
        });
    }

    group.finish();
}
