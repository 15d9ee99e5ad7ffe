//! Per-element bounding shapes.

use glam::DVec3;

use super::aabb::Aabb;
use super::intersect::{
    box_intersects_box, box_intersects_sphere, line_box_hit_point, line_sphere_hit_point,
};

/// Shape of an element's bounds. Chosen at construction, immutable after.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Axis-aligned box described by its half-size per axis.
    Box { extent: DVec3 },
    /// Sphere described by its radius.
    Sphere { radius: f64 },
}

/// Bounding volume of a grid element: a [`Shape`] positioned at an origin.
///
/// Small copyable value object. The origin moves when the element moves;
/// the shape never changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub origin: DVec3,
    shape: Shape,
}

impl Bounds {
    pub fn sphere(origin: DVec3, radius: f64) -> Self {
        Self {
            origin,
            shape: Shape::Sphere { radius },
        }
    }

    pub fn cuboid(origin: DVec3, extent: DVec3) -> Self {
        Self {
            origin,
            shape: Shape::Box { extent },
        }
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Worst-case radius: the stored radius for spheres, the half-diagonal
    /// for boxes. This is the value the grid checks against its cap.
    #[inline]
    pub fn radius(&self) -> f64 {
        match self.shape {
            Shape::Box { extent } => extent.length(),
            Shape::Sphere { radius } => radius,
        }
    }

    /// Tight axis-aligned box around the bounds.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        match self.shape {
            Shape::Box { extent } => Aabb::from_center_extent(self.origin, extent),
            Shape::Sphere { radius } => {
                Aabb::from_center_extent(self.origin, DVec3::splat(radius))
            }
        }
    }

    pub fn overlaps_sphere(&self, sphere_origin: DVec3, sphere_radius: f64) -> bool {
        match self.shape {
            Shape::Box { extent } => box_intersects_sphere(
                &Aabb::from_center_extent(self.origin, extent),
                sphere_origin,
                sphere_radius,
            ),
            Shape::Sphere { radius } => {
                let reach = radius + sphere_radius;
                sphere_origin.distance_squared(self.origin) <= reach * reach
            }
        }
    }

    pub fn overlaps_box(&self, box_origin: DVec3, box_extent: DVec3) -> bool {
        let other = Aabb::from_center_extent(box_origin, box_extent);
        match self.shape {
            Shape::Box { extent } => {
                box_intersects_box(&Aabb::from_center_extent(self.origin, extent), &other)
            }
            Shape::Sphere { radius } => box_intersects_sphere(&other, self.origin, radius),
        }
    }

    /// First intersection of the segment `start..end` with the bounds.
    pub fn line_hit_point(
        &self,
        start: DVec3,
        end: DVec3,
        dir: DVec3,
        inv_dir: DVec3,
    ) -> Option<DVec3> {
        match self.shape {
            Shape::Box { extent } => line_box_hit_point(
                &Aabb::from_center_extent(self.origin, extent),
                start,
                end,
                dir,
                inv_dir,
            ),
            Shape::Sphere { radius } => {
                line_sphere_hit_point(start, end, dir, self.origin, radius)
            }
        }
    }
}
