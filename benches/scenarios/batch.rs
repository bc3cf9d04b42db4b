//! Benchmarks for full recompute batches on the worker pool.

use criterion::{BenchmarkId, Criterion};
use glam::Vec3;
use saavy_room::engine::{BatchPlan, JobPool, Scheduler, SourceRequest};
use saavy_room::io::AudioClip;
use saavy_room::rir::RirParams;
use saavy_room::room::{CoefficientKind, Dimensions, Room, SurfaceCoefficients};
use saavy_room::SourceId;

pub fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/batch");
    group.sample_size(10);

    let scheduler = Scheduler::new(JobPool::new(0).unwrap());
    let room = Room::new(
        Dimensions::new(4.0, 5.0, 3.0),
        SurfaceCoefficients::uniform(0.8, CoefficientKind::Reflection),
    );
    let clip = AudioClip::mono((0..32_000).map(|i| (i as f32 * 0.02).sin()).collect(), 16_000);
    let n_samples = 4096;

    for &sources in &[1usize, 4, 8] {
        group.bench_with_input(BenchmarkId::new("sources", sources), &sources, |b, &sources| {
            b.iter(|| {
                let requests = (0..sources)
                    .map(|i| SourceRequest {
                        id: SourceId(i as u64),
                        params: RirParams::new(
                            Vec3::new(0.5 + 0.4 * i as f32, 1.0, 1.2),
                            Vec3::new(2.0, 2.5, 1.5),
                            room,
                            n_samples,
                        ),
                        clip: clip.clone(),
                    })
                    .collect();
                let plan = BatchPlan {
                    generation: 1,
                    reverberation_time: 0.5,
                    n_samples,
                };
                scheduler.schedule(plan, requests).drain()
            })
        });
    }

    group.finish();
}
