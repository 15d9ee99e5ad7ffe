//! Overlap and segment-intersection primitives used by grid queries.
//!
//! Segment routines take a precomputed unit `dir` and componentwise
//! reciprocal `inv_dir` so the hot traversal paths pay for the division
//! once per trace, not once per cell.

use glam::{DVec3, IVec3};

use super::aabb::Aabb;

/// Round a world-space vector to the nearest lattice coordinate.
///
/// Rounds half away from zero on every axis. Insert and move paths must
/// both go through this so an element on a half-cell line lands in the
/// same cell either way.
#[inline]
pub fn round_vec_to_cell(v: DVec3) -> IVec3 {
    v.round().as_ivec3()
}

/// Sphere/box overlap via the closest point on the box to the sphere centre.
#[inline]
pub fn box_intersects_sphere(b: &Aabb, center: DVec3, radius: f64) -> bool {
    box_intersects_sphere_sq(b, center, radius * radius)
}

/// [`box_intersects_sphere`] with a pre-squared radius.
#[inline]
pub fn box_intersects_sphere_sq(b: &Aabb, center: DVec3, radius_sq: f64) -> bool {
    b.closest_point(center).distance_squared(center) <= radius_sq
}

#[inline]
pub fn box_intersects_box(a: &Aabb, b: &Aabb) -> bool {
    if a.min.x > b.max.x || b.min.x > a.max.x {
        return false;
    }
    if a.min.y > b.max.y || b.min.y > a.max.y {
        return false;
    }
    if a.min.z > b.max.z || b.min.z > a.max.z {
        return false;
    }
    true
}

/// Slab test core: parametric entry and exit distances of an infinite line
/// against a box, or `None` on a miss.
///
/// An axis with zero direction (infinite `inv_dir`) contributes no entry or
/// exit; the line runs parallel to that slab and must already start inside
/// it, otherwise the whole line misses.
fn slab_entry_exit(b: &Aabb, start: DVec3, inv_dir: DVec3) -> Option<(f64, f64)> {
    let mut t_entry = f64::NEG_INFINITY;
    let mut t_exit = f64::INFINITY;

    for axis in 0..3 {
        let inv = inv_dir[axis];
        let s = start[axis];
        if inv.is_infinite() {
            if s < b.min[axis] || s > b.max[axis] {
                return None;
            }
            continue;
        }

        let t1 = (b.min[axis] - s) * inv;
        let t2 = (b.max[axis] - s) * inv;
        t_entry = t_entry.max(t1.min(t2));
        t_exit = t_exit.min(t1.max(t2));

        if t_entry > t_exit {
            return None;
        }
    }

    Some((t_entry, t_exit))
}

/// Whether the line through `start` with reciprocal direction `inv_dir`
/// crosses the box anywhere. No segment clipping; callers that need the
/// entry point or segment bounds use [`line_box_hit_point`].
#[inline]
pub fn line_intersects_box(b: &Aabb, start: DVec3, inv_dir: DVec3) -> bool {
    slab_entry_exit(b, start, inv_dir).is_some()
}

/// First intersection of the segment `start..end` with a box.
///
/// A start inside the box hits immediately at `start`. Entries behind the
/// start or beyond the segment end are misses.
pub fn line_box_hit_point(
    b: &Aabb,
    start: DVec3,
    end: DVec3,
    dir: DVec3,
    inv_dir: DVec3,
) -> Option<DVec3> {
    if b.contains_point(start) {
        return Some(start);
    }

    let (t_entry, _) = slab_entry_exit(b, start, inv_dir)?;

    if t_entry < 0.0 || t_entry * t_entry > start.distance_squared(end) {
        return None;
    }

    Some(start + dir * t_entry)
}

/// First intersection of the segment `start..end` with a sphere.
///
/// A start inside the sphere hits immediately at `start`. Hits behind the
/// start or beyond the segment end are misses.
pub fn line_sphere_hit_point(
    start: DVec3,
    end: DVec3,
    dir: DVec3,
    sphere_origin: DVec3,
    sphere_radius: f64,
) -> Option<DVec3> {
    let start_to_center = start - sphere_origin;
    let radius_sq = sphere_radius * sphere_radius;

    if start_to_center.length_squared() < radius_sq {
        return Some(start);
    }

    let v = dir.dot(sphere_origin - start);
    let discriminant = radius_sq - (start_to_center.length_squared() - v * v);

    if discriminant < 0.0 {
        return None;
    }

    let time = v - discriminant.sqrt();

    if time < 0.0 || time * time > start.distance_squared(end) {
        return None;
    }

    Some(start + dir * time)
}

#[inline]
pub fn line_intersects_sphere(
    start: DVec3,
    end: DVec3,
    dir: DVec3,
    sphere_origin: DVec3,
    sphere_radius: f64,
) -> bool {
    line_sphere_hit_point(start, end, dir, sphere_origin, sphere_radius).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: DVec3, end: DVec3) -> (DVec3, DVec3) {
        let dir = (end - start).normalize();
        (dir, dir.recip())
    }

    #[test]
    fn rounding_is_nearest_half_away_from_zero() {
        assert_eq!(round_vec_to_cell(DVec3::new(0.49, -0.49, 0.0)), IVec3::ZERO);
        assert_eq!(round_vec_to_cell(DVec3::new(0.5, 1.5, -0.5)), IVec3::new(1, 2, -1));
        assert_eq!(round_vec_to_cell(DVec3::new(-2.51, 2.51, 0.0)), IVec3::new(-3, 3, 0));
    }

    #[test]
    fn box_sphere_overlap_cases() {
        let b = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0));
        assert!(box_intersects_sphere(&b, DVec3::ZERO, 0.1));
        assert!(box_intersects_sphere(&b, DVec3::new(3.0, 0.0, 0.0), 2.0));
        assert!(!box_intersects_sphere(&b, DVec3::new(3.0, 0.0, 0.0), 1.9));
        // Corner approach: distance to corner is sqrt(3), not 1.
        assert!(!box_intersects_sphere(&b, DVec3::splat(2.0), 1.5));
        assert!(box_intersects_sphere(&b, DVec3::splat(2.0), 1.8));
    }

    #[test]
    fn box_box_overlap_touching_counts() {
        let a = Aabb::new(DVec3::ZERO, DVec3::splat(1.0));
        let b = Aabb::new(DVec3::new(1.0, 0.0, 0.0), DVec3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(DVec3::new(1.1, 0.0, 0.0), DVec3::new(2.0, 1.0, 1.0));
        assert!(box_intersects_box(&a, &b));
        assert!(!box_intersects_box(&a, &c));
    }

    #[test]
    fn slab_hit_and_miss() {
        let b = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0));
        let start = DVec3::new(-5.0, 0.0, 0.0);
        let (dir, inv) = segment(start, DVec3::new(5.0, 0.0, 0.0));
        assert!(line_intersects_box(&b, start, inv));

        let hit = line_box_hit_point(&b, start, DVec3::new(5.0, 0.0, 0.0), dir, inv).unwrap();
        assert_eq!(hit, DVec3::new(-1.0, 0.0, 0.0));

        // Offset past the box face on y.
        let start = DVec3::new(-5.0, 2.0, 0.0);
        let (_, inv) = segment(start, DVec3::new(5.0, 2.0, 0.0));
        assert!(!line_intersects_box(&b, start, inv));
    }

    #[test]
    fn slab_parallel_axis_needs_start_inside_slab() {
        let b = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0));
        // Pure +x direction: y and z slabs are parallel.
        let (dir, inv) = segment(DVec3::new(-5.0, 0.5, -0.5), DVec3::new(5.0, 0.5, -0.5));
        assert!(line_intersects_box(&b, DVec3::new(-5.0, 0.5, -0.5), inv));
        assert!(
            line_box_hit_point(&b, DVec3::new(-5.0, 0.5, -0.5), DVec3::new(5.0, 0.5, -0.5), dir, inv)
                .is_some()
        );
        // Same direction, but outside the y slab.
        assert!(!line_intersects_box(&b, DVec3::new(-5.0, 1.5, 0.0), inv));
    }

    #[test]
    fn segment_clipping_behind_and_beyond() {
        let b = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0));
        // Box behind the start.
        let start = DVec3::new(5.0, 0.0, 0.0);
        let end = DVec3::new(10.0, 0.0, 0.0);
        let (dir, inv) = segment(start, end);
        assert!(line_box_hit_point(&b, start, end, dir, inv).is_none());

        // Segment stops short of the box.
        let start = DVec3::new(-10.0, 0.0, 0.0);
        let end = DVec3::new(-5.0, 0.0, 0.0);
        let (dir, inv) = segment(start, end);
        assert!(line_box_hit_point(&b, start, end, dir, inv).is_none());
    }

    #[test]
    fn start_inside_box_hits_at_start() {
        let b = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0));
        let start = DVec3::new(0.25, -0.25, 0.0);
        let end = DVec3::new(5.0, 0.0, 0.0);
        let (dir, inv) = segment(start, end);
        assert_eq!(line_box_hit_point(&b, start, end, dir, inv), Some(start));
    }

    #[test]
    fn sphere_hit_point_front_surface() {
        let start = DVec3::new(-10.0, 0.0, 0.0);
        let end = DVec3::new(10.0, 0.0, 0.0);
        let (dir, _) = segment(start, end);
        let hit = line_sphere_hit_point(start, end, dir, DVec3::ZERO, 2.0).unwrap();
        assert!((hit - DVec3::new(-2.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn sphere_miss_cases() {
        let start = DVec3::new(-10.0, 0.0, 0.0);
        let end = DVec3::new(10.0, 0.0, 0.0);
        let (dir, _) = segment(start, end);
        // Passes above.
        assert!(line_sphere_hit_point(start, end, dir, DVec3::new(0.0, 3.0, 0.0), 2.0).is_none());
        // Sphere behind the start.
        assert!(line_sphere_hit_point(start, end, dir, DVec3::new(-20.0, 0.0, 0.0), 2.0).is_none());
        // Segment ends before reaching the sphere.
        let short_end = DVec3::new(-5.0, 0.0, 0.0);
        assert!(line_sphere_hit_point(start, short_end, dir, DVec3::ZERO, 2.0).is_none());
    }

    #[test]
    fn sphere_start_inside_hits_at_start() {
        let start = DVec3::new(0.5, 0.0, 0.0);
        let end = DVec3::new(10.0, 0.0, 0.0);
        let (dir, _) = segment(start, end);
        assert_eq!(line_sphere_hit_point(start, end, dir, DVec3::ZERO, 2.0), Some(start));
    }

    #[test]
    fn sphere_tangent_start_on_surface() {
        // Start exactly on the surface moving inward hits at the start.
        let start = DVec3::new(-2.0, 0.0, 0.0);
        let end = DVec3::new(10.0, 0.0, 0.0);
        let (dir, _) = segment(start, end);
        let hit = line_sphere_hit_point(start, end, dir, DVec3::ZERO, 2.0).unwrap();
        assert!((hit - start).length() < 1e-9);
    }
}
