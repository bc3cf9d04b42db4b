//! Scene snapshot handed over by the host on every recompute.
//!
//! The host engine owns the live scene graph. Instead of looking objects up
//! by name at compute time, it fills in a [`SceneSnapshot`] with everything
//! the resolver needs and passes it by reference.

use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};

use super::{AcousticElement, Dimensions, Surface};
use crate::SourceId;

/// World transform of the room box.
///
/// `scale` is the full interior extent along the room's local right, up and
/// forward axes. The room is centred on `position`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl RoomTransform {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Width along right, depth along forward, height along up.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.scale.x, self.scale.z, self.scale.y)
    }

    /// World position of the corner used as the acoustic origin.
    pub fn origin(&self) -> Vec3 {
        self.position
            - self.right() * self.scale.x / 2.0
            - self.up() * self.scale.y / 2.0
            - self.forward() * self.scale.z / 2.0
    }

    /// Express a world position in the room frame (x = width, y = depth, z = height).
    pub fn to_room_frame(&self, world: Vec3) -> Vec3 {
        let rel = world - self.origin();
        Vec3::new(rel.dot(self.right()), rel.dot(self.forward()), rel.dot(self.up()))
    }
}

/// Where a bounding surface sits and what it is made of.
#[derive(Debug, Clone)]
pub struct SurfacePlacement {
    pub surface: Surface,
    /// World position of the surface centre
    pub position: Vec3,
    /// Width and height of the surface in meters
    pub extent: Vec2,
    pub element: Arc<AcousticElement>,
}

impl SurfacePlacement {
    pub fn area(&self) -> f32 {
        self.extent.x * self.extent.y
    }
}

/// An acoustic panel, rug or free-standing absorber placed by the user.
#[derive(Debug, Clone)]
pub struct PlacedElement {
    pub position: Vec3,
    /// Footprint in meters
    pub footprint: Vec2,
    pub element: Arc<AcousticElement>,
}

impl PlacedElement {
    pub fn new(position: Vec3, footprint: Vec2, element: Arc<AcousticElement>) -> Self {
        Self {
            position,
            footprint,
            element,
        }
    }

    pub fn area(&self) -> f32 {
        self.footprint.x * self.footprint.y
    }
}

/// Everything the core reads from the host at trigger time.
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    pub room: RoomTransform,
    pub surfaces: Vec<SurfacePlacement>,
    /// Treatments attached to surfaces
    pub elements: Vec<PlacedElement>,
    /// Free-standing objects that add absorption but belong to no surface
    pub absorbers: Vec<PlacedElement>,
    /// World position of every active source
    pub sources: Vec<(SourceId, Vec3)>,
    /// World position of the listener
    pub receiver: Vec3,
}

impl SceneSnapshot {
    /// Axis-aligned room with its front-left-floor corner at the world origin,
    /// every surface finished with `element`.
    pub fn axis_aligned(dims: Dimensions, element: Arc<AcousticElement>) -> Self {
        let Dimensions {
            width: w,
            depth: d,
            height: h,
        } = dims;
        let room = RoomTransform::new(
            Vec3::new(w / 2.0, h / 2.0, d / 2.0),
            Quat::IDENTITY,
            Vec3::new(w, h, d),
        );

        let placements = [
            (Surface::FrontWall, Vec3::new(0.0, h / 2.0, d / 2.0), Vec2::new(d, h)),
            (Surface::BackWall, Vec3::new(w, h / 2.0, d / 2.0), Vec2::new(d, h)),
            (Surface::LeftWall, Vec3::new(w / 2.0, h / 2.0, 0.0), Vec2::new(w, h)),
            (Surface::RightWall, Vec3::new(w / 2.0, h / 2.0, d), Vec2::new(w, h)),
            (Surface::Floor, Vec3::new(w / 2.0, 0.0, d / 2.0), Vec2::new(w, d)),
            (Surface::Ceiling, Vec3::new(w / 2.0, h, d / 2.0), Vec2::new(w, d)),
        ];
        let surfaces = placements
            .into_iter()
            .map(|(surface, position, extent)| SurfacePlacement {
                surface,
                position,
                extent,
                element: element.clone(),
            })
            .collect();

        Self {
            room,
            surfaces,
            elements: Vec::new(),
            absorbers: Vec::new(),
            sources: Vec::new(),
            receiver: Vec3::new(w / 2.0, h / 2.0, d / 2.0),
        }
    }

    /// Replace the element on one surface.
    pub fn set_surface_element(&mut self, surface: Surface, element: Arc<AcousticElement>) {
        for placement in self.surfaces.iter_mut().filter(|p| p.surface == surface) {
            placement.element = element.clone();
        }
    }

    pub fn source_position(&self, id: SourceId) -> Option<Vec3> {
        self.sources
            .iter()
            .find(|(source, _)| *source == id)
            .map(|(_, pos)| *pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_axis_aligned_origin_is_world_origin() {
        let scene = SceneSnapshot::axis_aligned(
            Dimensions::new(4.0, 5.0, 3.0),
            AcousticElement::shared("plaster", 0.05, "plaster"),
        );
        assert!(scene.room.origin().length() < 1e-6);

        // World (x, y-up, z-forward) maps to room (width, depth, height)
        let p = scene.room.to_room_frame(Vec3::new(1.0, 1.5, 2.0));
        assert!((p - Vec3::new(1.0, 2.0, 1.5)).length() < 1e-6);

        let dims = scene.room.dimensions();
        assert_eq!(dims, Dimensions::new(4.0, 5.0, 3.0));
    }

    #[test]
    fn test_rotated_room_frame() {
        // Quarter turn about up: local right points along world -z
        let room = RoomTransform::new(
            Vec3::new(10.0, 1.5, 10.0),
            Quat::from_rotation_y(FRAC_PI_2),
            Vec3::new(4.0, 3.0, 6.0),
        );
        let centre = room.to_room_frame(room.position);
        assert!((centre - Vec3::new(2.0, 3.0, 1.5)).length() < 1e-4);

        let corner = room.to_room_frame(room.origin());
        assert!(corner.length() < 1e-4);
    }
}
