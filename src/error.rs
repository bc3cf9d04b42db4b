//! Error types for the acoustic pipeline.
//!
//! Each stage has its own error enum. Geometry errors reject a whole
//! recompute batch (coefficients are room-wide); everything else only
//! aborts the pipeline of the source it happened in.

use thiserror::Error;

use crate::room::Surface;
use crate::SourceId;

/// Errors raised while turning a scene snapshot into a room.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A room dimension is zero, negative or not finite
    #[error("Invalid room dimensions: {width} x {depth} x {height} m")]
    InvalidDimensions { width: f32, depth: f32, height: f32 },

    /// The snapshot did not contain a placement for a bounding surface
    #[error("Surface missing from scene snapshot: {0}")]
    MissingSurface(Surface),

    /// The snapshot contained two placements for the same surface
    #[error("Surface listed twice in scene snapshot: {0}")]
    DuplicateSurface(Surface),

    /// A bounding surface has no usable area
    #[error("Degenerate surface area for {surface}: {area} m²")]
    DegenerateSurface { surface: Surface, area: f32 },

    /// A registered source has no position in the snapshot
    #[error("Sound source {0} missing from scene snapshot")]
    MissingSource(SourceId),
}

/// Errors raised by the image-source generator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RirError {
    /// Room dimension is not strictly positive
    #[error("Invalid room dimension along {axis}: {value} m")]
    InvalidDimension { axis: char, value: f32 },

    /// Requested an empty impulse response
    #[error("Impulse response length must be non-zero")]
    EmptyResponse,

    /// Reflection coefficient is NaN or infinite
    #[error("Reflection coefficient for {0} is not finite")]
    NonFiniteCoefficient(Surface),

    /// Source and receiver share a position, the direct path has zero length
    #[error("Source and receiver are at the same position")]
    CoincidentPositions,

    /// Sample rate or speed of sound is not strictly positive
    #[error("Invalid propagation parameters: c={speed_of_sound} m/s, fs={sample_rate} Hz")]
    InvalidPropagation { speed_of_sound: f32, sample_rate: f32 },
}

/// Errors raised when deriving coefficients from a target reverberation time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReverbError {
    /// The room is too small for the requested decay
    #[error("Reverberation time {target:.2}s cannot be reached in this room (alpha = {alpha:.3})")]
    Unreachable { target: f32, alpha: f32 },

    /// Negative or non-finite target
    #[error("Invalid reverberation time: {0}")]
    InvalidTarget(f32),
}

/// Errors raised by the convolution engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvolutionError {
    /// Impulse response or signal is empty
    #[error("Cannot convolve empty input (impulse response {ir_len}, signal {signal_len})")]
    EmptyInput { ir_len: usize, signal_len: usize },

    /// Interleaved sample count does not divide into whole frames
    #[error("Sample count {samples} is not a multiple of {channels} channels")]
    RaggedChannels { samples: usize, channels: usize },
}

/// Errors raised while waiting on a worker job.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobError {
    /// The job panicked or its pool shut down before it reported back
    #[error("Worker job dropped before completing")]
    Disconnected,

    #[error("Failed to build worker pool: {0}")]
    PoolBuild(String),
}

/// Errors raised when handing buffers to the playback side.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// The command ring to the audio thread is full
    #[error("Playback command queue is full")]
    QueueFull,

    /// Every renderer voice is already assigned to a source
    #[error("No free playback voice (capacity {capacity})")]
    NoFreeVoice { capacity: usize },
}

/// Per-source failure inside a recompute batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Impulse response failed: {0}")]
    Rir(#[from] RirError),

    #[error("Convolution failed: {0}")]
    Convolution(#[from] ConvolutionError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("Playback refused the new buffer: {0}")]
    Playback(#[from] PlaybackError),
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors surfaced by the control loop when scheduling a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Reverb(#[from] ReverbError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

pub type GeometryResult<T> = Result<T, GeometryError>;
pub type RirResult<T> = Result<T, RirError>;
pub type ConvolutionResult<T> = Result<T, ConvolutionError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type SimResult<T> = Result<T, SimError>;
