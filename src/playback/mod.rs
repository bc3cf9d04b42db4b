//! Playable buffers and glitch-free replacement.
//!
//! Each source owns a [`PlaybackSlot`] holding the buffer currently handed
//! to the audio side. Buffers are immutable and shared: a recompute never
//! edits the playing buffer, it builds a new one and swaps it in.
//!
//! Swapping keeps the playhead on the same data index. With `n` frames in
//! the new buffer and `elapsed` frames played since the last (re)start:
//!
//! ```text
//! offset      = (offset + n - elapsed) mod n
//! start_frame = (n - offset) mod n
//! ```
//!
//! That is, playback resumes at `start + elapsed`, where the old buffer's
//! playhead was. When the new buffer has a different length the playhead
//! is first wrapped against the old length, then against the new one.

pub mod message;
#[cfg(feature = "rtrb")]
pub mod renderer;

use std::sync::Arc;

use crate::{error::PlaybackError, io::AudioClip, Generation, SourceId};

/// Interleaved audio ready to loop on the audio side.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackBuffer {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
    /// Geometry generation this was convolved for, `None` for the raw clip
    generation: Option<Generation>,
}

impl PlaybackBuffer {
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32, generation: Option<Generation>) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            sample_rate,
            generation,
        }
    }

    /// Unprocessed copy of a clip.
    pub fn dry(clip: &AudioClip) -> Self {
        Self::new(clip.samples().to_vec(), clip.channels(), clip.sample_rate(), None)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    pub fn is_wet(&self) -> bool {
        self.generation.is_some()
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }
}

/// Where playback resumes after a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPosition {
    pub offset: usize,
    pub start_frame: usize,
}

/// The buffer a source is playing and where it was started.
#[derive(Debug, Clone)]
pub struct PlaybackSlot {
    current: Arc<PlaybackBuffer>,
    start_frame: usize,
}

impl PlaybackSlot {
    pub fn new(buffer: Arc<PlaybackBuffer>) -> Self {
        Self {
            current: buffer,
            start_frame: 0,
        }
    }

    pub fn current(&self) -> &Arc<PlaybackBuffer> {
        &self.current
    }

    /// Accumulated rotation, `(len - start_frame) mod len`.
    pub fn offset(&self) -> usize {
        let len = self.current.frames();
        if len == 0 {
            0
        } else {
            (len - self.start_frame % len) % len
        }
    }

    /// Position for a buffer of `new_len` frames after `elapsed` frames of
    /// the current one.
    pub fn plan_swap(&self, new_len: usize, elapsed: usize) -> SwapPosition {
        let old_len = self.current.frames();
        if new_len == 0 || old_len == 0 {
            return SwapPosition {
                offset: 0,
                start_frame: 0,
            };
        }
        let playhead = (self.start_frame % old_len + elapsed % old_len) % old_len;
        let start_frame = playhead % new_len;
        SwapPosition {
            offset: (new_len - start_frame) % new_len,
            start_frame,
        }
    }

    /// Install `buffer` at a planned position. Returns the buffer it replaced.
    pub fn commit(&mut self, buffer: Arc<PlaybackBuffer>, position: SwapPosition) -> Arc<PlaybackBuffer> {
        self.start_frame = position.start_frame;
        std::mem::replace(&mut self.current, buffer)
    }

    /// Plan, hand the buffer to `sink`, and commit once the sink accepted it.
    pub fn swap(
        &mut self,
        source: SourceId,
        buffer: Arc<PlaybackBuffer>,
        sink: &mut dyn PlaybackSink,
    ) -> Result<Arc<PlaybackBuffer>, PlaybackError> {
        let elapsed = sink.elapsed_frames(source);
        let position = self.plan_swap(buffer.frames(), elapsed);
        sink.play(source, buffer.clone(), position.start_frame, elapsed)?;
        Ok(self.commit(buffer, position))
    }
}

/// Audio output owned by the host.
///
/// Playback loops: a buffer started at `start_frame` plays to its end and
/// wraps to frame 0.
pub trait PlaybackSink {
    /// Frames played for `source` since its playhead sat at the start frame
    /// of its latest [`PlaybackSink::play`].
    fn elapsed_frames(&self, source: SourceId) -> usize;

    /// Replace whatever `source` is playing, starting at `start_frame`.
    ///
    /// `elapsed` is the [`PlaybackSink::elapsed_frames`] reading the start
    /// frame was planned against, 0 for a fresh start. A sink that keeps
    /// playing while the command is in flight advances the new buffer by
    /// the frames played since that reading.
    fn play(
        &mut self,
        source: SourceId,
        buffer: Arc<PlaybackBuffer>,
        start_frame: usize,
        elapsed: usize,
    ) -> Result<(), PlaybackError>;

    fn set_volume(&mut self, source: SourceId, volume: f32) -> Result<(), PlaybackError>;

    fn stop(&mut self, source: SourceId) -> Result<(), PlaybackError>;
}
