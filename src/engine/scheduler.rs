//! Recompute batches: one impulse response job and one convolution job per
//! source, tagged with the geometry generation they were scheduled for.
//!
//! ```text
//! schedule ──→ [RIR a] [RIR b] [RIR c] [conv a] [conv b] [conv c]   (FIFO)
//!                 │       │       │       ▲        ▲        ▲
//!                 └───────┼───────┼───────┘        │        │
//!                         └───────┼────────────────┘        │
//!                                 └─────────────────────────┘
//! ```
//!
//! Every convolution job blocks on its own impulse response handle. Nothing
//! is shared between sources, so the jobs of one batch may finish in any
//! order; the batch is only applied once all of them have reported.

use std::time::Instant;

use super::pool::{JobHandle, JobPool};
use crate::{
    dsp::convolve_clip,
    error::{PipelineError, RirError},
    io::AudioClip,
    rir::{self, ImpulseResponse, RirParams},
    Generation, SourceId,
};

/// Work for one source in a batch.
pub struct SourceRequest {
    pub id: SourceId,
    pub params: RirParams,
    pub clip: AudioClip,
}

/// Batch-wide values decided before any job is spawned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchPlan {
    pub generation: Generation,
    pub reverberation_time: f32,
    pub n_samples: usize,
}

/// Convolved audio for one source.
#[derive(Debug, Clone, PartialEq)]
pub struct WetSignal {
    /// Interleaved, normalised to the clip's peak
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
    pub ir_len: usize,
    pub generation: Generation,
}

pub type SourceOutcome = Result<WetSignal, PipelineError>;

/// In-flight jobs of one recompute.
pub struct Batch {
    plan: BatchPlan,
    jobs: Vec<(SourceId, JobHandle<SourceOutcome>)>,
    started: Instant,
}

impl Batch {
    pub fn generation(&self) -> Generation {
        self.plan.generation
    }

    pub fn plan(&self) -> BatchPlan {
        self.plan
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn source_ids(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.jobs.iter().map(|(id, _)| *id)
    }

    /// True when every source has reported. An empty batch is finished.
    pub fn is_finished(&mut self) -> bool {
        self.jobs.iter_mut().all(|(_, handle)| handle.is_finished())
    }

    /// Wait for every job and return the outcomes in scheduling order.
    pub fn drain(self) -> Vec<(SourceId, SourceOutcome)> {
        let outcomes: Vec<_> = self
            .jobs
            .into_iter()
            .map(|(id, handle)| {
                let outcome = handle.wait().unwrap_or_else(|e| Err(e.into()));
                (id, outcome)
            })
            .collect();
        log::debug!(
            "Generation {} finished in {:?}",
            self.plan.generation,
            self.started.elapsed()
        );
        outcomes
    }
}

pub struct Scheduler {
    pool: JobPool,
}

impl Scheduler {
    pub fn new(pool: JobPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &JobPool {
        &self.pool
    }

    /// Spawn every impulse response job, then every convolution job.
    pub fn schedule(&self, plan: BatchPlan, requests: Vec<SourceRequest>) -> Batch {
        log::info!(
            "Scheduling generation {} for {} sources ({} samples, T60 {:.2}s)",
            plan.generation,
            requests.len(),
            plan.n_samples,
            plan.reverberation_time
        );

        let generation = plan.generation;
        let rir_jobs: Vec<_> = requests
            .into_iter()
            .map(|SourceRequest { id, params, clip }| {
                let handle = self.pool.spawn(move || -> Result<ImpulseResponse, RirError> {
                    let start = Instant::now();
                    let samples = rir::generate(&params)?;
                    log::debug!("Impulse response for {} took {:?}", id, start.elapsed());
                    Ok(ImpulseResponse::new(samples, params.sample_rate, generation))
                });
                (id, handle, clip)
            })
            .collect();

        let jobs = rir_jobs
            .into_iter()
            .map(|(id, rir_handle, clip)| {
                let handle = self
                    .pool
                    .spawn(move || convolve_source(id, rir_handle, clip));
                (id, handle)
            })
            .collect();

        Batch {
            plan,
            jobs,
            started: Instant::now(),
        }
    }
}

fn convolve_source(
    id: SourceId,
    rir_handle: JobHandle<Result<ImpulseResponse, RirError>>,
    clip: AudioClip,
) -> SourceOutcome {
    let ir = rir_handle.wait()??;
    if ir.sample_rate != clip.sample_rate() as f32 {
        log::debug!(
            "Source {} clip is {} Hz, impulse response is {} Hz",
            id,
            clip.sample_rate(),
            ir.sample_rate
        );
    }

    let start = Instant::now();
    let samples = convolve_clip(&ir.samples, &clip)?;
    log::debug!("Convolution for {} took {:?}", id, start.elapsed());

    Ok(WetSignal {
        samples,
        channels: clip.channels(),
        sample_rate: clip.sample_rate(),
        ir_len: ir.len(),
        generation: ir.generation,
    })
}
