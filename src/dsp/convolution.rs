//! FFT convolution of source audio with a room impulse response.
//!
//! Overlap-add splits the signal into hops of `R` samples so each block,
//! convolved with the `L`-tap response, fits in one `Nfft`-point transform
//! without wrapping around:
//!
//! ```text
//! Nfft = next_pow2(2L - 1)        R = Nfft - L + 1
//!
//! signal  |── R ──|── R ──|── R ──|─ partial ─|
//!            │       │       │        │
//!           FFT     FFT     FFT      FFT        × H (transformed once)
//!            │       │       │        │
//! output  |──── Nfft ────|
//!                 |──── Nfft ────|               blocks overlap by L - 1
//!                         |──── Nfft ────|       and are summed
//!                                 |──── Nfft ────|
//! ```
//!
//! The output has `L + Nsig - 1` samples. After convolution the output is
//! rescaled so its peak matches the input peak.

use rustfft::num_complex::Complex;

use super::fft::Radix2Fft;
use crate::{
    error::{ConvolutionError, ConvolutionResult},
    io::{converter, AudioClip},
};

const ZERO: Complex<f32> = Complex { re: 0.0, im: 0.0 };

fn check_inputs(ir: &[f32], signal: &[f32]) -> ConvolutionResult<()> {
    if ir.is_empty() || signal.is_empty() {
        return Err(ConvolutionError::EmptyInput {
            ir_len: ir.len(),
            signal_len: signal.len(),
        });
    }
    Ok(())
}

/// Overlap-add convolver for one impulse response.
///
/// The response spectrum is computed once in [`OverlapAdd::new`] and reused
/// for every block of every signal passed to [`OverlapAdd::process`].
pub struct OverlapAdd {
    fft: Radix2Fft,
    ir_spectrum: Vec<Complex<f32>>,
    ir_len: usize,
    hop: usize,
}

impl OverlapAdd {
    pub fn new(ir: &[f32]) -> ConvolutionResult<Self> {
        if ir.is_empty() {
            return Err(ConvolutionError::EmptyInput {
                ir_len: 0,
                signal_len: 0,
            });
        }

        let n_fft = (2 * ir.len() - 1).next_power_of_two();
        let fft = Radix2Fft::new(n_fft);

        let mut ir_spectrum = vec![ZERO; n_fft];
        for (bin, &tap) in ir_spectrum.iter_mut().zip(ir) {
            bin.re = tap;
        }
        fft.forward(&mut ir_spectrum);

        Ok(Self {
            fft,
            ir_spectrum,
            ir_len: ir.len(),
            hop: n_fft - ir.len() + 1,
        })
    }

    pub fn fft_len(&self) -> usize {
        self.fft.len()
    }

    /// Signal samples consumed per block.
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Blocks needed for a signal of `signal_len` samples.
    ///
    /// `1 + |Nsig - R| / R`, raised when needed so a trailing partial block
    /// is still processed.
    pub fn frame_count(&self, signal_len: usize) -> usize {
        let frames = 1 + signal_len.abs_diff(self.hop) / self.hop;
        frames.max(signal_len.div_ceil(self.hop))
    }

    /// Convolve `signal`, returning `ir_len + signal.len() - 1` samples.
    pub fn process(&self, signal: &[f32]) -> ConvolutionResult<Vec<f32>> {
        if signal.is_empty() {
            return Err(ConvolutionError::EmptyInput {
                ir_len: self.ir_len,
                signal_len: 0,
            });
        }

        let out_len = self.ir_len + signal.len() - 1;
        let mut out = vec![0.0f32; out_len];
        let mut block = vec![ZERO; self.fft.len()];

        for frame in 0..self.frame_count(signal.len()) {
            let offset = frame * self.hop;
            if offset >= signal.len() {
                break;
            }
            let end = (offset + self.hop).min(signal.len());

            block.fill(ZERO);
            for (bin, &sample) in block.iter_mut().zip(&signal[offset..end]) {
                bin.re = sample;
            }

            self.fft.forward(&mut block);
            for (bin, h) in block.iter_mut().zip(&self.ir_spectrum) {
                *bin *= h;
            }
            self.fft.inverse(&mut block);

            for (o, bin) in out[offset..].iter_mut().zip(&block) {
                *o += bin.re;
            }
        }

        Ok(out)
    }
}

/// Block convolution with a freshly planned [`OverlapAdd`].
pub fn convolve_overlap_add(ir: &[f32], signal: &[f32]) -> ConvolutionResult<Vec<f32>> {
    check_inputs(ir, signal)?;
    OverlapAdd::new(ir)?.process(signal)
}

/// Single transform over the whole zero-padded signal.
pub fn convolve_fft(ir: &[f32], signal: &[f32]) -> ConvolutionResult<Vec<f32>> {
    check_inputs(ir, signal)?;

    let out_len = ir.len() + signal.len() - 1;
    let fft = Radix2Fft::new(out_len.next_power_of_two());

    let pad = |x: &[f32]| {
        let mut buffer = vec![ZERO; fft.len()];
        for (bin, &s) in buffer.iter_mut().zip(x) {
            bin.re = s;
        }
        buffer
    };
    let mut a = pad(signal);
    let mut b = pad(ir);

    fft.forward(&mut a);
    fft.forward(&mut b);
    for (x, h) in a.iter_mut().zip(&b) {
        *x *= h;
    }
    fft.inverse(&mut a);

    Ok(a[..out_len].iter().map(|c| c.re).collect())
}

/// Time-domain reference convolution, `O(L · Nsig)`.
pub fn convolve_direct(ir: &[f32], signal: &[f32]) -> ConvolutionResult<Vec<f32>> {
    check_inputs(ir, signal)?;

    let mut out = vec![0.0f32; ir.len() + signal.len() - 1];
    for (i, &x) in signal.iter().enumerate() {
        for (o, &h) in out[i..].iter_mut().zip(ir) {
            *o += x * h;
        }
    }
    Ok(out)
}

/// Largest absolute sample value.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

/// Rescale `output` so its peak equals the peak of `input`.
///
/// A silent output is left untouched. Returns the factor applied.
pub fn normalize_peak(input: &[f32], output: &mut [f32]) -> f32 {
    let out_peak = peak(output);
    if out_peak == 0.0 {
        return 1.0;
    }

    let factor = peak(input) / out_peak;
    for sample in output.iter_mut() {
        *sample *= factor;
    }
    factor
}

/// Convolve every channel of `clip` with `ir` and normalise.
///
/// Returns interleaved samples, `ir.len() - 1` frames longer than the clip.
pub fn convolve_clip(ir: &[f32], clip: &AudioClip) -> ConvolutionResult<Vec<f32>> {
    check_inputs(ir, clip.samples())?;

    let convolver = OverlapAdd::new(ir)?;
    let channels = if clip.channels() == 1 {
        vec![convolver.process(clip.samples())?]
    } else {
        clip.channel_buffers()
            .iter()
            .map(|channel| convolver.process(channel))
            .collect::<ConvolutionResult<Vec<_>>>()?
    };

    let mut out = if channels.len() == 1 {
        channels.into_iter().next().unwrap_or_default()
    } else {
        converter::interleave(&channels)
    };
    normalize_peak(clip.samples(), &mut out);
    Ok(out)
}
