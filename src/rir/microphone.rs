//! Receiver directivity.
//!
//! First-order polar patterns, `ρ + (1 - ρ) · cos(angle off axis)`:
//!
//! | pattern         | ρ    |
//! | --------------- | ---- |
//! | bidirectional   | 0    |
//! | hypercardioid   | 0.25 |
//! | cardioid        | 0.5  |
//! | subcardioid     | 0.75 |
//! | omnidirectional | 1    |

use std::f32::consts::FRAC_PI_2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MicrophoneType {
    Bidirectional,
    Hypercardioid,
    Cardioid,
    Subcardioid,
    #[default]
    Omnidirectional,
}

impl MicrophoneType {
    pub fn rho(self) -> f32 {
        match self {
            MicrophoneType::Bidirectional => 0.0,
            MicrophoneType::Hypercardioid => 0.25,
            MicrophoneType::Cardioid => 0.5,
            MicrophoneType::Subcardioid => 0.75,
            MicrophoneType::Omnidirectional => 1.0,
        }
    }
}

/// Polar pattern plus pointing direction, in radians.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Microphone {
    pub pattern: MicrophoneType,
    /// Rotation in the x/y plane, 0 points along +x
    pub azimuth: f32,
    /// Angle above the x/y plane
    pub elevation: f32,
}

impl Microphone {
    pub fn new(pattern: MicrophoneType, azimuth: f32, elevation: f32) -> Self {
        Self {
            pattern,
            azimuth,
            elevation,
        }
    }

    pub fn omnidirectional() -> Self {
        Self::default()
    }

    /// Gain for sound arriving along `(x, y, z)` (image minus receiver).
    ///
    /// The vector must be non-zero for directional patterns.
    #[inline]
    pub fn gain(&self, x: f32, y: f32, z: f32) -> f32 {
        if self.pattern == MicrophoneType::Omnidirectional {
            return 1.0;
        }

        let rho = self.pattern.rho();
        let theta = (z / (x * x + y * y + z * z).sqrt()).acos();
        let phi = y.atan2(x);

        let polar = FRAC_PI_2 - self.elevation;
        let cos_angle = polar.sin() * theta.sin() * (self.azimuth - phi).cos() + polar.cos() * theta.cos();
        rho + (1.0 - rho) * cos_angle
    }
}
