//! Benchmarks for spectral primitives and the realtime renderer.

mod convolution;
mod fft;
mod highpass;
mod playback;

pub use convolution::bench_convolution;
pub use fft::bench_fft;
pub use highpass::bench_highpass;
pub use playback::bench_playback;
