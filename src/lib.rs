pub mod config; // Simulation settings, YAML loading
pub mod dsp; // FFT and convolution
pub mod engine; // Worker pool and batch scheduling
pub mod error;
pub mod io;
pub mod playback; // Buffer swapping and realtime rendering
pub mod rir; // Image-source impulse responses
pub mod room; // Geometry, coefficients, reverberation time
pub mod simulator;

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use config::SimulationConfig;
pub use simulator::{Simulator, Telemetry};

/// Speed of sound in air, m/s
pub const SPEED_OF_SOUND: f32 = 343.0;
/// Sample rate the impulse response is computed at
pub const DEFAULT_SAMPLE_RATE: f32 = 16_000.0;
/// Impulse response length cap, in samples
pub const DEFAULT_MAX_SAMPLES: usize = 1 << 13;

/// Recompute counter. Results tagged with an older generation are discarded.
pub type Generation = u64;

/// Stable handle for a registered sound source.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
