//! Control loop.
//!
//! ```text
//! request_recompute()          update(scene, sink)
//!        │                            │
//!        ▼                            ▼
//!    dirty = true ──→ resolve ──→ size buffers ──→ schedule batch (gen N)
//!                                                        │
//!                     apply when every job reported  ◀───┘
//! ```
//!
//! Everything here runs on the caller's thread. Heavy work happens on the
//! worker pool; `update` only polls, so it can be called once per frame.
//!
//! At most one batch is in flight. Requests made while it runs are folded
//! into a single recompute scheduled after it has been applied.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    config::SimulationConfig,
    engine::{Batch, BatchPlan, JobPool, Scheduler, SourceRequest},
    error::{PipelineError, PlaybackError, SimResult},
    io::AudioClip,
    playback::{PlaybackBuffer, PlaybackSink, PlaybackSlot},
    rir::RirParams,
    room::{
        resolve,
        reverberation::{self, MIN_REVERBERATION_TIME},
        Room, SceneSnapshot,
    },
    Generation, SourceId,
};

/// Values shown to the user after each scheduled recompute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub generation: Generation,
    /// Seconds
    pub reverberation_time: f32,
    pub n_samples: usize,
    pub sources: usize,
}

impl Telemetry {
    pub fn display_reverberation_time(&self) -> String {
        reverberation::format_reverberation_time(self.reverberation_time)
    }
}

/// What happened when a finished batch was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub generation: Generation,
    /// Sources now playing the new buffer
    pub applied: Vec<SourceId>,
    /// Sources that kept their previous buffer
    pub failed: Vec<(SourceId, PipelineError)>,
}

struct SoundSource {
    clip: AudioClip,
    dry: Arc<PlaybackBuffer>,
    wet: Option<Arc<PlaybackBuffer>>,
    slot: PlaybackSlot,
    volume: f32,
    started: bool,
    /// Last start attempt failed; logged once
    stalled: bool,
}

impl SoundSource {
    fn start(&mut self, id: SourceId, sink: &mut dyn PlaybackSink) -> Result<(), PlaybackError> {
        sink.set_volume(id, self.volume)?;
        sink.play(id, self.slot.current().clone(), 0, 0)?;
        self.started = true;
        self.stalled = false;
        Ok(())
    }

    fn target(&self, wet: bool) -> &Arc<PlaybackBuffer> {
        match (&self.wet, wet) {
            (Some(buffer), true) => buffer,
            _ => &self.dry,
        }
    }
}

pub struct Simulator {
    config: SimulationConfig,
    scheduler: Scheduler,
    sources: BTreeMap<SourceId, SoundSource>,
    next_id: u64,
    generation: Generation,
    dirty: bool,
    pending: Option<Batch>,
    wet: bool,
    telemetry: Option<Telemetry>,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> SimResult<Self> {
        let pool = JobPool::new(config.worker_threads)?;
        Ok(Self {
            config,
            scheduler: Scheduler::new(pool),
            sources: BTreeMap::new(),
            next_id: 0,
            generation: 0,
            dirty: false,
            pending: None,
            wet: true,
            telemetry: None,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Register a source. It plays its raw clip until its first impulse
    /// response has been applied.
    pub fn add_source(&mut self, clip: AudioClip, volume: f32) -> SourceId {
        let id = SourceId(self.next_id);
        self.next_id += 1;

        let dry = Arc::new(PlaybackBuffer::dry(&clip));
        self.sources.insert(
            id,
            SoundSource {
                clip,
                slot: PlaybackSlot::new(dry.clone()),
                dry,
                wet: None,
                volume,
                started: false,
                stalled: false,
            },
        );
        log::info!("Registered source {}", id);
        self.request_recompute();
        id
    }

    /// Stop and forget a source. If the sink refuses the stop, the source
    /// stays registered so the call can be retried.
    pub fn remove_source(&mut self, id: SourceId, sink: &mut dyn PlaybackSink) -> SimResult<bool> {
        if !self.sources.contains_key(&id) {
            return Ok(false);
        }
        sink.stop(id)?;
        self.sources.remove(&id);
        log::info!("Removed source {}", id);
        Ok(true)
    }

    pub fn source_ids(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.sources.keys().copied()
    }

    pub fn set_volume(&mut self, id: SourceId, volume: f32, sink: &mut dyn PlaybackSink) -> SimResult<()> {
        if let Some(source) = self.sources.get_mut(&id) {
            source.volume = volume;
            if source.started {
                sink.set_volume(id, volume)?;
            }
        }
        Ok(())
    }

    /// Switch every source between its simulated and its raw audio.
    ///
    /// A source the sink refuses keeps its current buffer; the others are
    /// still switched and the first refusal is returned.
    pub fn set_wet(&mut self, wet: bool, sink: &mut dyn PlaybackSink) -> SimResult<()> {
        if self.wet == wet {
            return Ok(());
        }
        self.wet = wet;
        log::info!("Room simulation {}", if wet { "on" } else { "off" });

        let mut refused = None;
        for (&id, source) in self.sources.iter_mut() {
            let target = source.target(wet).clone();
            if !source.started {
                source.slot = PlaybackSlot::new(target);
            } else if !Arc::ptr_eq(&target, source.slot.current()) {
                if let Err(e) = source.slot.swap(id, target, sink) {
                    log::warn!("Source {} could not switch: {}", id, e);
                    refused.get_or_insert(e);
                }
            }
        }
        match refused {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub fn is_wet(&self) -> bool {
        self.wet
    }

    /// Ask for a recompute on the next [`Simulator::update`]. Calling this
    /// several times before then schedules one batch.
    pub fn request_recompute(&mut self) {
        self.dirty = true;
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn telemetry(&self) -> Option<Telemetry> {
        self.telemetry
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Currently installed buffer for a source.
    pub fn current_buffer(&self, id: SourceId) -> Option<&Arc<PlaybackBuffer>> {
        self.sources.get(&id).map(|s| s.slot.current())
    }

    /// True while a recompute has been requested but not yet scheduled.
    pub fn needs_recompute(&self) -> bool {
        self.dirty
    }

    /// Non-blocking tick: start new sources, apply a finished batch, and
    /// schedule a new one if a recompute was requested and no batch is in
    /// flight.
    ///
    /// A geometry error rejects the recompute; sources keep playing what
    /// they had. A source the sink cannot start is retried on the next tick.
    pub fn update(&mut self, scene: &SceneSnapshot, sink: &mut dyn PlaybackSink) -> SimResult<Option<BatchReport>> {
        self.start_new_sources(sink);

        let mut report = None;
        let finished = self.pending.as_mut().is_some_and(|batch| batch.is_finished());
        if finished {
            if let Some(batch) = self.pending.take() {
                report = self.apply(batch, sink);
            }
        }

        if self.dirty && self.pending.is_none() {
            self.dirty = false;
            self.schedule(scene)?;
        }
        Ok(report)
    }

    /// Block until the pending batch is done and apply it. A recompute
    /// requested meanwhile is scheduled by the next [`Simulator::update`].
    pub fn finish_pending(&mut self, sink: &mut dyn PlaybackSink) -> SimResult<Option<BatchReport>> {
        self.start_new_sources(sink);
        Ok(self.pending.take().and_then(|batch| self.apply(batch, sink)))
    }

    fn start_new_sources(&mut self, sink: &mut dyn PlaybackSink) {
        for (&id, source) in self.sources.iter_mut().filter(|(_, s)| !s.started) {
            if let Err(e) = source.start(id, sink) {
                if source.stalled {
                    log::debug!("Source {} still waiting for playback: {}", id, e);
                } else {
                    log::warn!("Source {} could not start playback: {}", id, e);
                }
                source.stalled = true;
            }
        }
    }

    fn schedule(&mut self, scene: &SceneSnapshot) -> SimResult<()> {
        let ids: Vec<SourceId> = self.sources.keys().copied().collect();
        let resolved = resolve(scene, &ids).map_err(|e| {
            log::warn!("Recompute rejected, keeping previous audio: {}", e);
            e
        })?;

        let c = self.config.speed_of_sound;
        let fs = self.config.sample_rate;
        let (room, reverberation_time) = match self.config.target_reverberation_time {
            Some(target) => {
                let coefficients = reverberation::coefficients_for_target(&resolved.room.dimensions, target, c)
                    .map_err(|e| {
                        log::warn!("Recompute rejected: {}", e);
                        e
                    })?;
                (Room::new(resolved.room.dimensions, coefficients), target)
            }
            None => {
                let t60 = reverberation::reverberation_time(&resolved.room, resolved.absorber_area, c);
                (resolved.room.with_reflection(), t60)
            }
        };
        let n_samples = reverberation::sample_count(
            reverberation_time.max(MIN_REVERBERATION_TIME),
            fs,
            self.config.max_samples,
        );

        self.generation += 1;
        if let Some(stale) = self.pending.take() {
            log::debug!(
                "Generation {} superseded by {}, dropping its results",
                stale.generation(),
                self.generation
            );
        }

        let requests = resolved
            .sources
            .iter()
            .filter_map(|&(id, position)| {
                let source = self.sources.get(&id)?;
                let params = RirParams::new(position, resolved.receiver, room, n_samples)
                    .microphone(self.config.microphone)
                    .reflection_order(self.config.reflection_order)
                    .sample_rate(fs)
                    .speed_of_sound(c)
                    .high_pass(self.config.high_pass);
                Some(SourceRequest {
                    id,
                    params,
                    clip: source.clip.clone(),
                })
            })
            .collect();

        let plan = BatchPlan {
            generation: self.generation,
            reverberation_time,
            n_samples,
        };
        self.telemetry = Some(Telemetry {
            generation: self.generation,
            reverberation_time,
            n_samples,
            sources: ids.len(),
        });
        self.pending = Some(self.scheduler.schedule(plan, requests));
        Ok(())
    }

    fn apply(&mut self, batch: Batch, sink: &mut dyn PlaybackSink) -> Option<BatchReport> {
        let generation = batch.generation();
        if generation != self.generation {
            log::debug!("Dropping stale generation {}", generation);
            return None;
        }

        let mut report = BatchReport {
            generation,
            applied: Vec::new(),
            failed: Vec::new(),
        };

        for (id, outcome) in batch.drain() {
            let Some(source) = self.sources.get_mut(&id) else {
                log::debug!("Source {} removed before its results arrived", id);
                continue;
            };
            let wet = match outcome {
                Ok(wet) => wet,
                Err(e) => {
                    log::warn!("Source {} keeps previous audio: {}", id, e);
                    report.failed.push((id, e));
                    continue;
                }
            };

            let buffer = Arc::new(PlaybackBuffer::new(
                wet.samples,
                wet.channels,
                wet.sample_rate,
                Some(wet.generation),
            ));
            source.wet = Some(buffer.clone());
            if !self.wet {
                report.applied.push(id);
                continue;
            }

            let installed = if source.started {
                source.slot.swap(id, buffer, sink).map(drop)
            } else {
                source.slot = PlaybackSlot::new(buffer);
                source.start(id, sink)
            };
            match installed {
                Ok(()) => report.applied.push(id),
                Err(e) => {
                    log::warn!("Source {} could not play generation {}: {}", id, generation, e);
                    report.failed.push((id, e.into()));
                }
            }
        }

        log::info!(
            "Applied generation {} ({} sources, {} failed)",
            generation,
            report.applied.len(),
            report.failed.len()
        );
        Some(report)
    }
}
