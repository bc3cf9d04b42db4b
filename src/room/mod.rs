//! Room model: dimensions, bounding surfaces and their acoustic coefficients.
//!
//! ```text
//!              ceiling (z = height)
//!             ┌────────────────────┐
//!   left      │                    │ right
//!  (y = 0)    │   x → width        │ (y = depth)
//!             │   y → depth        │
//!             │   z → height       │
//!             └────────────────────┘
//!   front wall at x = 0, back wall at x = width, floor at z = 0
//! ```
//!
//! Coefficients come in two flavours. Absorption (NRC) is what materials are
//! rated in, reflection (β) is what the image-source method consumes:
//!
//! ```text
//! β = sqrt(|1 - α|)        α = 1 - β²
//! ```
//!
//! A [`Room`] is a value: conversions return a new room rather than mutating
//! the old one, so a recompute batch can hold on to the exact geometry it
//! was scheduled with.

pub mod element;
pub mod resolver;
pub mod reverberation;
pub mod scene;

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use element::AcousticElement;
pub use resolver::{resolve, ResolvedScene};
pub use scene::{PlacedElement, RoomTransform, SceneSnapshot, SurfacePlacement};

/// Convert an absorption coefficient to a reflection coefficient.
#[inline]
pub fn absorption_to_reflection(alpha: f32) -> f32 {
    (1.0 - alpha).abs().sqrt()
}

/// Convert a reflection coefficient back to an absorption coefficient.
#[inline]
pub fn reflection_to_absorption(beta: f32) -> f32 {
    1.0 - beta * beta
}

/// One of the six bounding surfaces of a rectangular room.
///
/// Declaration order is the tie-break order used when assigning elements
/// to their nearest surface.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    FrontWall,
    BackWall,
    LeftWall,
    RightWall,
    Floor,
    Ceiling,
}

impl Surface {
    pub const ALL: [Surface; 6] = [
        Surface::FrontWall,
        Surface::BackWall,
        Surface::LeftWall,
        Surface::RightWall,
        Surface::Floor,
        Surface::Ceiling,
    ];

    /// Position in [`Surface::ALL`] and in coefficient arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Area of this surface in a room of the given dimensions.
    pub fn area(self, dims: &Dimensions) -> f32 {
        match self {
            Surface::FrontWall | Surface::BackWall => dims.depth * dims.height,
            Surface::LeftWall | Surface::RightWall => dims.width * dims.height,
            Surface::Floor | Surface::Ceiling => dims.width * dims.depth,
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Surface::FrontWall => "front wall",
            Surface::BackWall => "back wall",
            Surface::LeftWall => "left wall",
            Surface::RightWall => "right wall",
            Surface::Floor => "floor",
            Surface::Ceiling => "ceiling",
        };
        f.write_str(name)
    }
}

/// Interior size of the room in meters.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub width: f32,
    pub depth: f32,
    pub height: f32,
}

impl Dimensions {
    pub fn new(width: f32, depth: f32, height: f32) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    pub fn volume(&self) -> f32 {
        self.width * self.depth * self.height
    }

    pub fn surface_area(&self) -> f32 {
        2.0 * (self.width * self.depth + self.width * self.height + self.depth * self.height)
    }

    /// True when every side is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.width, self.depth, self.height]
            .iter()
            .all(|d| d.is_finite() && *d > 0.0)
    }

    pub fn as_array(&self) -> [f32; 3] {
        [self.width, self.depth, self.height]
    }
}

/// Which representation a [`SurfaceCoefficients`] holds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoefficientKind {
    Absorption,
    Reflection,
}

/// Per-surface coefficients, indexed by [`Surface::index`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceCoefficients {
    values: [f32; 6],
    kind: CoefficientKind,
}

impl SurfaceCoefficients {
    pub fn new(values: [f32; 6], kind: CoefficientKind) -> Self {
        Self { values, kind }
    }

    pub fn absorption(values: [f32; 6]) -> Self {
        Self::new(values, CoefficientKind::Absorption)
    }

    pub fn reflection(values: [f32; 6]) -> Self {
        Self::new(values, CoefficientKind::Reflection)
    }

    /// Same coefficient on every surface.
    pub fn uniform(value: f32, kind: CoefficientKind) -> Self {
        Self::new([value; 6], kind)
    }

    pub fn kind(&self) -> CoefficientKind {
        self.kind
    }

    pub fn get(&self, surface: Surface) -> f32 {
        self.values[surface.index()]
    }

    pub fn values(&self) -> &[f32; 6] {
        &self.values
    }

    /// Reflection representation, converting if needed.
    pub fn to_reflection(&self) -> Self {
        match self.kind {
            CoefficientKind::Reflection => *self,
            CoefficientKind::Absorption => Self::reflection(self.values.map(absorption_to_reflection)),
        }
    }

    /// Absorption representation, converting if needed.
    pub fn to_absorption(&self) -> Self {
        match self.kind {
            CoefficientKind::Absorption => *self,
            CoefficientKind::Reflection => Self::absorption(self.values.map(reflection_to_absorption)),
        }
    }
}

/// Rectangular room for one geometry generation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Room {
    pub dimensions: Dimensions,
    pub coefficients: SurfaceCoefficients,
}

impl Room {
    pub fn new(dimensions: Dimensions, coefficients: SurfaceCoefficients) -> Self {
        Self {
            dimensions,
            coefficients,
        }
    }

    /// Copy of this room with reflection coefficients.
    pub fn with_reflection(&self) -> Self {
        Self::new(self.dimensions, self.coefficients.to_reflection())
    }

    /// Sum of `α_i · A_i` over the six bounding surfaces (Sabine absorption area).
    pub fn absorption_area(&self) -> f32 {
        let alpha = self.coefficients.to_absorption();
        Surface::ALL
            .iter()
            .map(|&s| alpha.get(s) * s.area(&self.dimensions))
            .sum()
    }
}
