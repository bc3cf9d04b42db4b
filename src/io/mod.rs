// Purpose - audio clips handed in by the host, format conversions

pub mod converter;

use std::sync::Arc;

use crate::error::{ConvolutionError, ConvolutionResult};

/// Raw interleaved PCM for one sound source.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Arc<[f32]>,
    channels: usize,
    sample_rate: u32,
}

impl AudioClip {
    /// Wrap interleaved samples. Fails if they do not divide into whole frames.
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32) -> ConvolutionResult<Self> {
        if channels == 0 || samples.len() % channels != 0 {
            return Err(ConvolutionError::RaggedChannels {
                samples: samples.len(),
                channels,
            });
        }
        Ok(Self {
            samples: samples.into(),
            channels,
            sample_rate,
        })
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            channels: 1,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Shared handle to the sample data.
    pub fn shared_samples(&self) -> Arc<[f32]> {
        self.samples.clone()
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// One buffer per channel.
    pub fn channel_buffers(&self) -> Vec<Vec<f32>> {
        converter::deinterleave(&self.samples, self.channels)
    }
}
