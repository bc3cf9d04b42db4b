//! Image-source room impulse response generator.
//!
//! Every reflection path in a shoebox room is equivalent to a straight path
//! from a mirrored copy of the source. The generator walks the lattice of
//! mirrored sources, and for each image that arrives within the response
//! window adds a band-limited impulse at its fractional delay:
//!
//! ```text
//!        image (mx=-1)      room       image (mx=+1)
//!      ┌─────────────┬─────────────┬─────────────┐
//!      │        ◦    │    •    ▲   │   ◦         │
//!      └─────────────┴─────────────┴─────────────┘
//!                      source  receiver
//! ```
//!
//! Distances are measured in samples (`meters / (c / fs)`), so the image
//! delay is the integer part of the distance and the kernel takes care of
//! the fraction. Each image is attenuated by spherical spreading and by the
//! product of the reflection coefficients of the walls it bounced off.

pub mod highpass;
pub mod microphone;

use std::f32::consts::PI;

use glam::Vec3;

use crate::{
    error::{RirError, RirResult},
    room::{Room, Surface},
    Generation, DEFAULT_SAMPLE_RATE, SPEED_OF_SOUND,
};

pub use self::{
    highpass::HighPass,
    microphone::{Microphone, MicrophoneType},
};

/// Normalised cutoff of the fractional-delay kernel (Nyquist)
const KERNEL_CUTOFF: f32 = 0.5;
/// Kernel length in seconds
const KERNEL_SECONDS: f32 = 0.004;

/// Everything needed to compute one impulse response.
#[derive(Debug, Clone, PartialEq)]
pub struct RirParams {
    /// Source position in the room frame, meters
    pub source: Vec3,
    /// Receiver position in the room frame, meters
    pub receiver: Vec3,
    pub room: Room,
    pub microphone: Microphone,
    /// Maximum reflection order, `None` for every image inside the window
    pub reflection_order: Option<u32>,
    pub n_samples: usize,
    pub sample_rate: f32,
    pub speed_of_sound: f32,
    pub high_pass: bool,
}

impl RirParams {
    pub fn new(source: Vec3, receiver: Vec3, room: Room, n_samples: usize) -> Self {
        Self {
            source,
            receiver,
            room,
            microphone: Microphone::omnidirectional(),
            reflection_order: None,
            n_samples,
            sample_rate: DEFAULT_SAMPLE_RATE,
            speed_of_sound: SPEED_OF_SOUND,
            high_pass: false,
        }
    }

    pub fn microphone(mut self, microphone: Microphone) -> Self {
        self.microphone = microphone;
        self
    }

    pub fn reflection_order(mut self, order: Option<u32>) -> Self {
        self.reflection_order = order;
        self
    }

    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn speed_of_sound(mut self, speed_of_sound: f32) -> Self {
        self.speed_of_sound = speed_of_sound;
        self
    }

    pub fn high_pass(mut self, enabled: bool) -> Self {
        self.high_pass = enabled;
        self
    }
}

/// Impulse response for one source, tagged with the geometry generation it
/// was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    pub samples: Vec<f32>,
    pub sample_rate: f32,
    pub generation: Generation,
}

impl ImpulseResponse {
    pub fn new(samples: Vec<f32>, sample_rate: f32, generation: Generation) -> Self {
        Self {
            samples,
            sample_rate,
            generation,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Compute a room impulse response of `params.n_samples` samples.
///
/// Deterministic: the same parameters always produce the same samples.
pub fn generate(params: &RirParams) -> RirResult<Vec<f32>> {
    validate(params)?;

    let fs = params.sample_rate;
    let c_ts = params.speed_of_sound / fs;
    let n_samples = params.n_samples;
    let beta = params.room.coefficients.to_reflection();
    let beta = *beta.values();

    let s = params.source / c_ts;
    let r = params.receiver / c_ts;
    let l = Vec3::from_array(params.room.dimensions.as_array()) / c_ts;

    let tw = (2.0 * (KERNEL_SECONDS * fs).round()) as usize;
    let mut kernel = vec![0.0f32; tw];
    let mut ir = vec![0.0f32; n_samples];

    let n1 = (n_samples as f32 / (2.0 * l.x)).ceil() as i32;
    let n2 = (n_samples as f32 / (2.0 * l.y)).ceil() as i32;
    let n3 = (n_samples as f32 / (2.0 * l.z)).ceil() as i32;

    for mx in -n1..=n1 {
        let rm_x = 2.0 * mx as f32 * l.x;
        for my in -n2..=n2 {
            let rm_y = 2.0 * my as f32 * l.y;
            for mz in -n3..=n3 {
                let rm_z = 2.0 * mz as f32 * l.z;

                for q in 0..=1 {
                    let x = (1 - 2 * q) as f32 * s.x - r.x + rm_x;
                    let refl_x = wall_gain(beta[0], beta[1], mx, q);

                    for j in 0..=1 {
                        let y = (1 - 2 * j) as f32 * s.y - r.y + rm_y;
                        let refl_y = wall_gain(beta[2], beta[3], my, j);

                        for k in 0..=1 {
                            if let Some(order) = params.reflection_order {
                                let image_order = (2 * mx - q).unsigned_abs()
                                    + (2 * my - j).unsigned_abs()
                                    + (2 * mz - k).unsigned_abs();
                                if image_order > order {
                                    continue;
                                }
                            }

                            let z = (1 - 2 * k) as f32 * s.z - r.z + rm_z;
                            let refl_z = wall_gain(beta[4], beta[5], mz, k);

                            let dist = (x * x + y * y + z * z).sqrt();
                            let fdist = dist.floor();
                            if fdist >= n_samples as f32 {
                                continue;
                            }

                            let gain = params.microphone.gain(x, y, z) * refl_x * refl_y * refl_z
                                / (4.0 * PI * dist * c_ts);

                            fill_kernel(&mut kernel, dist - fdist);
                            let start = fdist as i64 - (tw / 2) as i64 + 1;
                            for (n, tap) in kernel.iter().enumerate() {
                                let idx = start + n as i64;
                                if idx >= 0 && (idx as usize) < n_samples {
                                    ir[idx as usize] += gain * tap;
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    if params.high_pass {
        HighPass::new(fs).render(&mut ir);
    }

    Ok(ir)
}

/// `β_near^|m - q| · β_far^|m|` for one axis.
#[inline]
fn wall_gain(near: f32, far: f32, m: i32, parity: i32) -> f32 {
    near.powi((m - parity).abs()) * far.powi(m.abs())
}

/// Hann-windowed sinc centred on the fractional part of the delay.
fn fill_kernel(kernel: &mut [f32], fraction: f32) {
    let tw = kernel.len() as f32;
    for (n, tap) in kernel.iter_mut().enumerate() {
        let t = (n as f32 - 0.5 * tw + 1.0) - fraction;
        let window = 0.5 * (1.0 + (2.0 * PI * t / tw).cos());
        *tap = window * 2.0 * KERNEL_CUTOFF * sinc(2.0 * PI * KERNEL_CUTOFF * t);
    }
}

#[inline]
fn sinc(x: f32) -> f32 {
    if x == 0.0 {
        1.0
    } else {
        x.sin() / x
    }
}

fn validate(params: &RirParams) -> RirResult<()> {
    let dims = params.room.dimensions;
    for (axis, value) in ['x', 'y', 'z'].into_iter().zip(dims.as_array()) {
        if !(value.is_finite() && value > 0.0) {
            return Err(RirError::InvalidDimension { axis, value });
        }
    }

    if params.n_samples == 0 {
        return Err(RirError::EmptyResponse);
    }

    let (c, fs) = (params.speed_of_sound, params.sample_rate);
    if !(c.is_finite() && c > 0.0 && fs.is_finite() && fs > 0.0) {
        return Err(RirError::InvalidPropagation {
            speed_of_sound: c,
            sample_rate: fs,
        });
    }

    let beta = params.room.coefficients.to_reflection();
    if let Some(surface) = Surface::ALL.into_iter().find(|&s| !beta.get(s).is_finite()) {
        return Err(RirError::NonFiniteCoefficient(surface));
    }

    if params.source.distance(params.receiver) <= f32::EPSILON {
        return Err(RirError::CoincidentPositions);
    }

    Ok(())
}
