//! Acoustic treatments that can be assigned to surfaces.

use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A named surface treatment rated by its noise reduction coefficient.
///
/// Elements are immutable once built and shared through [`Arc`]: several
/// walls (and several placed panels) may point at the same element.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AcousticElement {
    pub name: String,
    /// Noise reduction coefficient, nominally 0..1
    pub nrc: f32,
    /// Key of the visual material the host renders this element with
    pub material: String,
}

impl AcousticElement {
    pub fn new(name: impl Into<String>, nrc: f32, material: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nrc,
            material: material.into(),
        }
    }

    /// Build a shared element.
    pub fn shared(name: impl Into<String>, nrc: f32, material: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(name, nrc, material))
    }
}
