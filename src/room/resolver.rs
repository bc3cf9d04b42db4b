//! Geometry & coefficient resolver.
//!
//! Turns a [`SceneSnapshot`] into the plain numbers the simulation needs:
//! room dimensions, one blended absorption coefficient per surface, and
//! every position re-expressed relative to the room corner.
//!
//! Placed elements (panels, rugs, ...) are attached to the surface whose
//! centre is closest. Each surface then blends its base material with the
//! elements on it, weighted by area:
//!
//! ```text
//! coeff = (base_nrc * (wall_area - Σ element_area) + Σ element_nrc * element_area) / wall_area
//! ```
//!
//! Nothing is clamped: elements covering more than the wall push the blend
//! outside 0..1. That case is logged and passed through unchanged.

use glam::Vec3;

use super::{
    scene::{PlacedElement, SceneSnapshot, SurfacePlacement},
    Room, Surface, SurfaceCoefficients,
};
use crate::{
    error::{GeometryError, GeometryResult},
    SourceId,
};

/// Output of [`resolve`], everything expressed in the room frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScene {
    /// Room with absorption coefficients
    pub room: Room,
    pub receiver: Vec3,
    /// Positions of the requested sources, in request order
    pub sources: Vec<(SourceId, Vec3)>,
    /// Σ nrc · area of free-standing absorbers
    pub absorber_area: f32,
    /// Number of placed elements attached to each surface
    pub element_counts: [usize; 6],
}

impl ResolvedScene {
    pub fn source_position(&self, id: SourceId) -> Option<Vec3> {
        self.sources
            .iter()
            .find(|(source, _)| *source == id)
            .map(|(_, pos)| *pos)
    }
}

/// Resolve a snapshot for the given active sources.
///
/// Fails if any surface or requested source is missing: coefficients are
/// room-wide, so a partial snapshot cannot produce a partial result.
pub fn resolve(scene: &SceneSnapshot, active: &[SourceId]) -> GeometryResult<ResolvedScene> {
    let dimensions = scene.room.dimensions();
    if !dimensions.is_valid() {
        return Err(GeometryError::InvalidDimensions {
            width: dimensions.width,
            depth: dimensions.depth,
            height: dimensions.height,
        });
    }

    let placements = collect_surfaces(&scene.surfaces)?;

    // Attach each element to its nearest surface
    let mut assigned: [Vec<&PlacedElement>; 6] = Default::default();
    for element in &scene.elements {
        let surface = nearest_surface(element.position, &placements);
        assigned[surface.index()].push(element);
    }

    let mut values = [0.0f32; 6];
    for surface in Surface::ALL {
        let placement = placements[surface.index()];
        let coeff = blended_coefficient(placement, &assigned[surface.index()]);
        if !(0.0..=1.0).contains(&coeff) {
            log::warn!(
                "Blended absorption for {} is {:.3}, outside 0..1 (elements cover {:.2} of {:.2} m²)",
                surface,
                coeff,
                assigned[surface.index()].iter().map(|e| e.area()).sum::<f32>(),
                placement.area()
            );
        }
        values[surface.index()] = coeff;
    }

    let sources = active
        .iter()
        .map(|&id| {
            scene
                .source_position(id)
                .map(|world| (id, scene.room.to_room_frame(world)))
                .ok_or(GeometryError::MissingSource(id))
        })
        .collect::<GeometryResult<Vec<_>>>()?;

    let absorber_area = scene
        .absorbers
        .iter()
        .map(|a| a.element.nrc * a.area())
        .sum();

    Ok(ResolvedScene {
        room: Room::new(dimensions, SurfaceCoefficients::absorption(values)),
        receiver: scene.room.to_room_frame(scene.receiver),
        sources,
        absorber_area,
        element_counts: assigned.each_ref().map(Vec::len),
    })
}

/// Index the snapshot's placements by surface, rejecting gaps and duplicates.
fn collect_surfaces<'a>(
    surfaces: &'a [SurfacePlacement],
) -> GeometryResult<[&'a SurfacePlacement; 6]> {
    let mut slots: [Option<&'a SurfacePlacement>; 6] = [None; 6];
    for placement in surfaces {
        let slot = &mut slots[placement.surface.index()];
        if slot.is_some() {
            return Err(GeometryError::DuplicateSurface(placement.surface));
        }
        let area = placement.area();
        if !(area.is_finite() && area > 0.0) {
            return Err(GeometryError::DegenerateSurface {
                surface: placement.surface,
                area,
            });
        }
        *slot = Some(placement);
    }

    let [front, back, left, right, floor, ceiling] = slots;
    let get = |slot: Option<&'a SurfacePlacement>, surface| {
        slot.ok_or(GeometryError::MissingSurface(surface))
    };
    Ok([
        get(front, Surface::FrontWall)?,
        get(back, Surface::BackWall)?,
        get(left, Surface::LeftWall)?,
        get(right, Surface::RightWall)?,
        get(floor, Surface::Floor)?,
        get(ceiling, Surface::Ceiling)?,
    ])
}

/// Closest surface centre; ties go to the surface listed first in [`Surface::ALL`].
pub fn nearest_surface(position: Vec3, placements: &[&SurfacePlacement; 6]) -> Surface {
    let mut best = Surface::FrontWall;
    let mut best_dist = f32::INFINITY;
    for surface in Surface::ALL {
        let dist = position.distance(placements[surface.index()].position);
        if dist < best_dist {
            best = surface;
            best_dist = dist;
        }
    }
    best
}

/// Area-weighted absorption of a surface and the elements attached to it.
pub fn blended_coefficient(placement: &SurfacePlacement, elements: &[&PlacedElement]) -> f32 {
    let base_nrc = placement.element.nrc;
    if elements.is_empty() {
        return base_nrc;
    }

    let wall_area = placement.area();
    let (covered, absorbed) = elements.iter().fold((0.0f32, 0.0f32), |(s, a), e| {
        let area = e.area();
        (s + area, a + e.element.nrc * area)
    });

    (base_nrc * (wall_area - covered) + absorbed) / wall_area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{AcousticElement, CoefficientKind, Dimensions};
    use glam::Vec2;

    fn plaster_room() -> SceneSnapshot {
        SceneSnapshot::axis_aligned(
            Dimensions::new(4.0, 5.0, 3.0),
            AcousticElement::shared("plaster", 0.1, "plaster"),
        )
    }

    #[test]
    fn test_untreated_room_uses_base_nrc() {
        let scene = plaster_room();
        let resolved = resolve(&scene, &[]).unwrap();

        assert_eq!(resolved.room.coefficients.kind(), CoefficientKind::Absorption);
        for surface in Surface::ALL {
            assert!((resolved.room.coefficients.get(surface) - 0.1).abs() < 1e-6);
        }
        assert_eq!(resolved.room.dimensions, Dimensions::new(4.0, 5.0, 3.0));
        assert_eq!(resolved.element_counts, [0; 6]);
    }

    #[test]
    fn test_panel_blends_into_nearest_wall() {
        let mut scene = plaster_room();
        let foam = AcousticElement::shared("foam", 0.9, "foam");
        // Near the back wall (x = 4), 1 x 1.5 panel
        scene.elements.push(PlacedElement::new(
            Vec3::new(3.9, 1.5, 2.5),
            Vec2::new(1.0, 1.5),
            foam,
        ));

        let resolved = resolve(&scene, &[]).unwrap();
        assert_eq!(resolved.element_counts[Surface::BackWall.index()], 1);

        // back wall is depth x height = 15 m²
        let expected = (0.1 * (15.0 - 1.5) + 0.9 * 1.5) / 15.0;
        let got = resolved.room.coefficients.get(Surface::BackWall);
        assert!((got - expected).abs() < 1e-6, "expected {expected}, got {got}");
        assert!((resolved.room.coefficients.get(Surface::FrontWall) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_ties_go_to_first_surface() {
        // Tall room: the centre is 2 m from front and back, further from the rest
        let scene = SceneSnapshot::axis_aligned(
            Dimensions::new(4.0, 5.0, 6.0),
            AcousticElement::shared("plaster", 0.1, "plaster"),
        );
        let placements = collect_surfaces(&scene.surfaces).unwrap();
        let centre = Vec3::new(2.0, 3.0, 2.5);
        let dist_front = centre.distance(placements[0].position);
        let dist_back = centre.distance(placements[1].position);
        assert_eq!(dist_front, dist_back);
        assert_eq!(nearest_surface(centre, &placements), Surface::FrontWall);
    }

    #[test]
    fn test_oversized_element_is_not_clamped() {
        let mut scene = plaster_room();
        let foam = AcousticElement::shared("foam", 0.9, "foam");
        // 6 x 4 rug on a 20 m² floor
        scene.elements.push(PlacedElement::new(
            Vec3::new(2.0, 0.0, 2.5),
            Vec2::new(6.0, 4.0),
            foam,
        ));

        let resolved = resolve(&scene, &[]).unwrap();
        let floor = resolved.room.coefficients.get(Surface::Floor);
        let expected = (0.1 * (20.0 - 24.0) + 0.9 * 24.0) / 20.0;
        assert!((floor - expected).abs() < 1e-5);
        assert!(floor > 1.0);
    }

    #[test]
    fn test_missing_surface_fails_batch() {
        let mut scene = plaster_room();
        scene.surfaces.retain(|p| p.surface != Surface::Ceiling);
        assert_eq!(
            resolve(&scene, &[]),
            Err(GeometryError::MissingSurface(Surface::Ceiling))
        );
    }

    #[test]
    fn test_duplicate_surface_fails_batch() {
        let mut scene = plaster_room();
        let extra = scene.surfaces[4].clone();
        scene.surfaces.push(extra);
        assert_eq!(
            resolve(&scene, &[]),
            Err(GeometryError::DuplicateSurface(Surface::Floor))
        );
    }

    #[test]
    fn test_degenerate_geometry_rejected() {
        let mut scene = plaster_room();
        scene.room.scale.y = 0.0;
        assert!(matches!(
            resolve(&scene, &[]),
            Err(GeometryError::InvalidDimensions { .. })
        ));

        let mut scene = plaster_room();
        scene.surfaces[2].extent = Vec2::new(0.0, 3.0);
        assert!(matches!(
            resolve(&scene, &[]),
            Err(GeometryError::DegenerateSurface {
                surface: Surface::LeftWall,
                ..
            })
        ));
    }

    #[test]
    fn test_sources_resolved_in_room_frame() {
        let mut scene = plaster_room();
        // World (x, y-up, z-forward)
        scene.sources.push((SourceId(7), Vec3::new(1.0, 1.5, 1.0)));
        scene.receiver = Vec3::new(3.0, 1.5, 4.0);

        let resolved = resolve(&scene, &[SourceId(7)]).unwrap();
        let src = resolved.source_position(SourceId(7)).unwrap();
        assert!((src - Vec3::new(1.0, 1.0, 1.5)).length() < 1e-6);
        assert!((resolved.receiver - Vec3::new(3.0, 4.0, 1.5)).length() < 1e-6);

        assert_eq!(
            resolve(&scene, &[SourceId(7), SourceId(8)]),
            Err(GeometryError::MissingSource(SourceId(8)))
        );
    }

    #[test]
    fn test_absorbers_summed() {
        let mut scene = plaster_room();
        let sofa = AcousticElement::shared("sofa", 0.5, "fabric");
        scene
            .absorbers
            .push(PlacedElement::new(Vec3::new(2.0, 0.4, 2.0), Vec2::new(2.0, 1.0), sofa));
        let resolved = resolve(&scene, &[]).unwrap();
        assert!((resolved.absorber_area - 1.0).abs() < 1e-6);
    }
}
