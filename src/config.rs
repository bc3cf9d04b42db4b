//! Simulation settings.
//!
//! Every field has a default, so a YAML file only needs the keys it changes:
//!
//! ```yaml
//! sample_rate: 22050
//! reflection_order: 12
//! microphone:
//!   pattern: cardioid
//!   azimuth: 1.57
//! ```

#[cfg(feature = "serde")]
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, ConfigResult},
    rir::Microphone,
    DEFAULT_MAX_SAMPLES, DEFAULT_SAMPLE_RATE, SPEED_OF_SOUND,
};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    #[cfg_attr(feature = "serde", serde(default = "SimulationConfig::default_speed_of_sound"))]
    pub speed_of_sound: f32,
    /// Rate the impulse response is computed at, Hz
    #[cfg_attr(feature = "serde", serde(default = "SimulationConfig::default_sample_rate"))]
    pub sample_rate: f32,
    /// Impulse response length cap, in samples
    #[cfg_attr(feature = "serde", serde(default = "SimulationConfig::default_max_samples"))]
    pub max_samples: usize,
    /// `None` keeps every image inside the response window
    #[cfg_attr(feature = "serde", serde(default))]
    pub reflection_order: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub microphone: Microphone,
    #[cfg_attr(feature = "serde", serde(default))]
    pub high_pass: bool,
    /// Worker threads for impulse response and convolution jobs, 0 for one per core
    #[cfg_attr(feature = "serde", serde(default))]
    pub worker_threads: usize,
    /// Impose a reverberation time instead of estimating it from materials
    #[cfg_attr(feature = "serde", serde(default))]
    pub target_reverberation_time: Option<f32>,
    /// Command ring size between control and audio threads
    #[cfg_attr(feature = "serde", serde(default = "SimulationConfig::default_ring_capacity"))]
    pub ring_capacity: usize,
}

impl SimulationConfig {
    fn default_speed_of_sound() -> f32 {
        SPEED_OF_SOUND
    }
    fn default_sample_rate() -> f32 {
        DEFAULT_SAMPLE_RATE
    }
    fn default_max_samples() -> usize {
        DEFAULT_MAX_SAMPLES
    }
    fn default_ring_capacity() -> usize {
        64
    }

    /// Read and validate a YAML config file.
    #[cfg(feature = "serde")]
    pub fn load(path: &Path) -> ConfigResult<Self> {
        log::info!("Loading simulation config from {:?}", path);
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    #[cfg(feature = "serde")]
    pub fn from_yaml(contents: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`SimulationConfig::load`], but a missing file yields the defaults.
    #[cfg(feature = "serde")]
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let positive = |field: &'static str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {}", value),
                })
            }
        };
        positive("speed_of_sound", self.speed_of_sound)?;
        positive("sample_rate", self.sample_rate)?;

        if self.max_samples == 0 {
            return Err(ConfigError::Invalid {
                field: "max_samples",
                reason: "must be at least 1".into(),
            });
        }
        if self.ring_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "ring_capacity",
                reason: "must be at least 1".into(),
            });
        }
        if let Some(t60) = self.target_reverberation_time {
            if !(t60.is_finite() && t60 >= 0.0) {
                return Err(ConfigError::Invalid {
                    field: "target_reverberation_time",
                    reason: format!("must be zero or positive, got {}", t60),
                });
            }
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            speed_of_sound: Self::default_speed_of_sound(),
            sample_rate: Self::default_sample_rate(),
            max_samples: Self::default_max_samples(),
            reflection_order: None,
            microphone: Microphone::default(),
            high_pass: false,
            worker_threads: 0,
            target_reverberation_time: None,
            ring_capacity: Self::default_ring_capacity(),
        }
    }
}
