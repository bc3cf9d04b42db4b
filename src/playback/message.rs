use std::sync::Arc;

#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use super::PlaybackBuffer;

/// Control thread → audio thread.
#[derive(Debug, Clone)]
pub enum PlaybackCommand {
    Play {
        voice: usize,
        buffer: Arc<PlaybackBuffer>,
        start_frame: usize,
        /// Voice frame counter `start_frame` was planned at
        at_frame: usize,
    },
    SetVolume {
        voice: usize,
        volume: f32,
    },
    Stop {
        voice: usize,
    },
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<PlaybackCommand>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<PlaybackCommand> {
    fn pop(&mut self) -> Option<PlaybackCommand> {
        Consumer::pop(self).ok()
    }
}
