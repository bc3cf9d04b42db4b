//! Realtime side of playback.
//!
//! ```text
//!  control thread                          audio thread
//! ┌──────────────┐  PlaybackCommand ring  ┌───────────────────┐
//! │   RingSink   │ ─────────────────────→ │ PlaybackRenderer  │
//! │              │ ←───────────────────── │   render_block()  │
//! └──────────────┘  retired buffer ring   └───────────────────┘
//!         ▲                                        │
//!         └─────── rendered frames (atomics) ──────┘
//! ```
//!
//! The renderer never frees memory: buffers it stops playing are pushed
//! back to the control thread and dropped there.
//!
//! Each voice counts the frames it has rendered, never resetting. A `Play`
//! carries the counter value its start frame was planned at, so frames
//! rendered while the command sat in the ring are skipped on arrival.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer, RingBuffer};

use super::{
    message::{MessageReceiver, PlaybackCommand},
    PlaybackBuffer, PlaybackSink,
};
use crate::{error::PlaybackError, SourceId};

/// Build a connected sink/renderer pair.
///
/// `capacity` bounds the number of commands in flight, `max_voices` the
/// number of sources that can play at once.
pub fn channel(capacity: usize, max_voices: usize) -> (RingSink, PlaybackRenderer<Consumer<PlaybackCommand>>) {
    let (tx, rx) = RingBuffer::new(capacity);
    let (retire_tx, retire_rx) = RingBuffer::new(capacity + max_voices);
    let rendered: Arc<[AtomicUsize]> = (0..max_voices).map(|_| AtomicUsize::new(0)).collect();

    let sink = RingSink {
        tx,
        retired: retire_rx,
        voices: HashMap::new(),
        free: (0..max_voices).rev().collect(),
        origins: vec![0; max_voices],
        rendered: rendered.clone(),
        max_voices,
    };
    let renderer = PlaybackRenderer::new(rx, retire_tx, rendered);
    (sink, renderer)
}

/// [`PlaybackSink`] that forwards to a [`PlaybackRenderer`] over a ring.
pub struct RingSink {
    tx: Producer<PlaybackCommand>,
    retired: Consumer<Arc<PlaybackBuffer>>,
    voices: HashMap<SourceId, usize>,
    free: Vec<usize>,
    /// Counter value at which each voice's latest start frame applies
    origins: Vec<usize>,
    rendered: Arc<[AtomicUsize]>,
    max_voices: usize,
}

impl RingSink {
    /// Drop buffers the renderer has finished with. Returns how many.
    pub fn collect_retired(&mut self) -> usize {
        let mut count = 0;
        while self.retired.pop().is_ok() {
            count += 1;
        }
        count
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    fn voice_for(&mut self, source: SourceId) -> Result<usize, PlaybackError> {
        if let Some(&voice) = self.voices.get(&source) {
            return Ok(voice);
        }
        let voice = self.free.pop().ok_or(PlaybackError::NoFreeVoice {
            capacity: self.max_voices,
        })?;
        self.origins[voice] = self.rendered[voice].load(Ordering::Relaxed);
        self.voices.insert(source, voice);
        Ok(voice)
    }

    fn send(&mut self, command: PlaybackCommand) -> Result<(), PlaybackError> {
        self.collect_retired();
        self.tx.push(command).map_err(|_| PlaybackError::QueueFull)
    }
}

impl PlaybackSink for RingSink {
    fn elapsed_frames(&self, source: SourceId) -> usize {
        self.voices
            .get(&source)
            .map(|&voice| {
                self.rendered[voice]
                    .load(Ordering::Relaxed)
                    .saturating_sub(self.origins[voice])
            })
            .unwrap_or(0)
    }

    fn play(
        &mut self,
        source: SourceId,
        buffer: Arc<PlaybackBuffer>,
        start_frame: usize,
        elapsed: usize,
    ) -> Result<(), PlaybackError> {
        let voice = self.voice_for(source)?;
        let at_frame = self.origins[voice] + elapsed;
        self.send(PlaybackCommand::Play {
            voice,
            buffer,
            start_frame,
            at_frame,
        })?;
        self.origins[voice] = at_frame;
        Ok(())
    }

    fn set_volume(&mut self, source: SourceId, volume: f32) -> Result<(), PlaybackError> {
        let voice = self.voice_for(source)?;
        self.send(PlaybackCommand::SetVolume { voice, volume })
    }

    fn stop(&mut self, source: SourceId) -> Result<(), PlaybackError> {
        let Some(&voice) = self.voices.get(&source) else {
            return Ok(());
        };
        self.send(PlaybackCommand::Stop { voice })?;
        self.voices.remove(&source);
        self.free.push(voice);
        Ok(())
    }
}

struct Voice {
    buffer: Option<Arc<PlaybackBuffer>>,
    position: usize,
    volume: f32,
}

/// Mixes every playing source into the device buffer.
pub struct PlaybackRenderer<R: MessageReceiver> {
    rx: R,
    retire: Producer<Arc<PlaybackBuffer>>,
    voices: Vec<Voice>,
    rendered: Arc<[AtomicUsize]>,
}

impl<R: MessageReceiver> PlaybackRenderer<R> {
    pub fn new(rx: R, retire: Producer<Arc<PlaybackBuffer>>, rendered: Arc<[AtomicUsize]>) -> Self {
        let voices = (0..rendered.len())
            .map(|_| Voice {
                buffer: None,
                position: 0,
                volume: 1.0,
            })
            .collect();
        Self {
            rx,
            retire,
            voices,
            rendered,
        }
    }

    fn retire(&mut self, buffer: Option<Arc<PlaybackBuffer>>) {
        if let Some(buffer) = buffer {
            // Ring full: the buffer is dropped here instead
            let _ = self.retire.push(buffer);
        }
    }

    fn handle(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::Play {
                voice,
                buffer,
                start_frame,
                at_frame,
            } => {
                let Some(v) = self.voices.get_mut(voice) else {
                    return;
                };
                let late = self.rendered[voice].load(Ordering::Relaxed).saturating_sub(at_frame);
                let frames = buffer.frames();
                v.position = if frames == 0 { 0 } else { (start_frame + late) % frames };
                let old = v.buffer.replace(buffer);
                self.retire(old);
            }
            PlaybackCommand::SetVolume { voice, volume } => {
                if let Some(v) = self.voices.get_mut(voice) {
                    v.volume = volume;
                }
            }
            PlaybackCommand::Stop { voice } => {
                let Some(v) = self.voices.get_mut(voice) else {
                    return;
                };
                let old = v.buffer.take();
                v.position = 0;
                v.volume = 1.0;
                self.retire(old);
            }
        }
    }

    /// Render interleaved `out` with `channels` channels, looping every voice.
    ///
    /// Mono buffers are copied to every output channel; wider buffers map
    /// channel `c` to output channel `c mod buffer_channels`.
    pub fn render_block(&mut self, out: &mut [f32], channels: usize) {
        while let Some(command) = self.rx.pop() {
            self.handle(command);
        }

        out.fill(0.0);
        let channels = channels.max(1);
        let frames = out.len() / channels;

        for (index, voice) in self.voices.iter_mut().enumerate() {
            let Some(buffer) = &voice.buffer else {
                continue;
            };
            let len = buffer.frames();
            if len == 0 {
                continue;
            }

            let width = buffer.channels();
            let samples = buffer.samples();
            for frame in out.chunks_exact_mut(channels) {
                let src = &samples[voice.position * width..(voice.position + 1) * width];
                for (ch, o) in frame.iter_mut().enumerate() {
                    *o += src[ch % width] * voice.volume;
                }
                voice.position += 1;
                if voice.position == len {
                    voice.position = 0;
                }
            }
            self.rendered[index].fetch_add(frames, Ordering::Relaxed);
        }
    }
}
