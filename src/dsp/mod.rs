//! Spectral processing used to apply room responses to source audio.
//!
//! These run on worker threads, not the audio thread: they allocate their
//! output and scratch buffers per call.

/// FFT convolution (overlap-add, single-pass, direct reference).
pub mod convolution;
/// In-place radix-2 FFT.
pub mod fft;

pub use convolution::{convolve_clip, convolve_overlap_add, normalize_peak, OverlapAdd};
pub use fft::{Direction, Radix2Fft};
