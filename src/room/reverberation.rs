//! Reverberation time estimation (Sabine).
//!
//! ```text
//! T60 = 24 · ln(10) · V / (c · Σ α_i · A_i)
//! ```
//!
//! The estimate sizes the impulse response buffer: the image-source loop
//! grows with the number of samples, so the result is capped by
//! [`sample_count`]. Short estimates are floored at
//! [`MIN_REVERBERATION_TIME`] so the buffer never collapses.

use std::f32::consts::LN_10;

use super::{CoefficientKind, Dimensions, Room, SurfaceCoefficients};
use crate::error::ReverbError;

/// Shortest reverberation time the estimator reports, in seconds
pub const MIN_REVERBERATION_TIME: f32 = 0.128;

/// Sabine estimate for `room`, with `extra_absorption` (m² sabins) from
/// objects that are not part of any surface.
///
/// A room with no absorption at all never decays; that reports `+∞` and
/// is bounded later by the sample cap.
pub fn reverberation_time(room: &Room, extra_absorption: f32, speed_of_sound: f32) -> f32 {
    let absorption = room.absorption_area() + extra_absorption;
    let volume = room.dimensions.volume();

    if absorption == 0.0 {
        return f32::INFINITY;
    }

    let t60 = 24.0 * LN_10 * volume / (speed_of_sound * absorption);
    // Negative absorption only comes from out-of-range blends
    if t60.is_nan() || t60 < MIN_REVERBERATION_TIME {
        MIN_REVERBERATION_TIME
    } else {
        t60
    }
}

/// Impulse response length for a reverberation time: `min(T · fs, max_samples)`.
pub fn sample_count(reverberation_time: f32, sample_rate: f32, max_samples: usize) -> usize {
    let samples = reverberation_time * sample_rate;
    if samples > max_samples as f32 {
        max_samples
    } else {
        samples as usize
    }
}

/// Uniform reflection coefficients that make an empty room of `dims` decay
/// in `target` seconds.
///
/// A target of zero yields an anechoic room (β = 0 everywhere).
pub fn coefficients_for_target(
    dims: &Dimensions,
    target: f32,
    speed_of_sound: f32,
) -> Result<SurfaceCoefficients, ReverbError> {
    if !target.is_finite() || target < 0.0 {
        return Err(ReverbError::InvalidTarget(target));
    }
    if target == 0.0 {
        return Ok(SurfaceCoefficients::uniform(0.0, CoefficientKind::Reflection));
    }

    let alpha = 24.0 * dims.volume() * LN_10 / (speed_of_sound * dims.surface_area() * target);
    if alpha > 1.0 {
        return Err(ReverbError::Unreachable { target, alpha });
    }

    Ok(SurfaceCoefficients::uniform(
        (1.0 - alpha).sqrt(),
        CoefficientKind::Reflection,
    ))
}

/// Two-decimal display string, e.g. `"0.54"`.
pub fn format_reverberation_time(seconds: f32) -> String {
    format!("{:.2}", seconds)
}
