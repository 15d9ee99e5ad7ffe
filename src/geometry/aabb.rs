//! Axis-aligned bounding boxes in world space.

use glam::DVec3;

/// Axis-aligned box spanning `min..=max` on every axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// The empty box: contains no point, identity for [`Aabb::union`].
    pub const EMPTY: Self = Self {
        min: DVec3::INFINITY,
        max: DVec3::NEG_INFINITY,
    };

    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Box centred on `center` with half-size `extent` per axis.
    #[inline]
    pub fn from_center_extent(center: DVec3, extent: DVec3) -> Self {
        Self {
            min: center - extent,
            max: center + extent,
        }
    }

    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size per axis. Negative for the empty box.
    #[inline]
    pub fn extent(&self) -> DVec3 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Smallest box containing both operands.
    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Inclusive containment on all axes.
    #[inline]
    pub fn contains_point(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    #[inline]
    pub fn contains_box(&self, other: &Aabb) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Point of the box closest to `p`. Returns `p` itself when inside.
    #[inline]
    pub fn closest_point(&self, p: DVec3) -> DVec3 {
        p.clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_union_identity() {
        let b = Aabb::from_center_extent(DVec3::new(5.0, -2.0, 1.0), DVec3::splat(3.0));
        assert!(Aabb::EMPTY.is_empty());
        assert_eq!(Aabb::EMPTY.union(&b), b);
        assert_eq!(b.union(&Aabb::EMPTY), b);
        assert!(!Aabb::EMPTY.contains_point(DVec3::ZERO));
    }

    #[test]
    fn union_covers_both() {
        let a = Aabb::new(DVec3::ZERO, DVec3::splat(1.0));
        let b = Aabb::new(DVec3::splat(2.0), DVec3::splat(3.0));
        let u = a.union(&b);
        assert!(u.contains_box(&a));
        assert!(u.contains_box(&b));
        assert_eq!(u.min, DVec3::ZERO);
        assert_eq!(u.max, DVec3::splat(3.0));
    }

    #[test]
    fn contains_is_inclusive() {
        let b = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0));
        assert!(b.contains_point(DVec3::splat(1.0)));
        assert!(b.contains_point(DVec3::splat(-1.0)));
        assert!(!b.contains_point(DVec3::new(1.0, 0.0, 1.000001)));
    }

    #[test]
    fn closest_point_clamps() {
        let b = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0));
        assert_eq!(b.closest_point(DVec3::new(5.0, 0.5, -9.0)), DVec3::new(1.0, 0.5, -1.0));
        let inside = DVec3::new(0.25, -0.75, 0.0);
        assert_eq!(b.closest_point(inside), inside);
    }

    #[test]
    fn center_and_extent_roundtrip() {
        let b = Aabb::from_center_extent(DVec3::new(10.0, 20.0, -30.0), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(b.center(), DVec3::new(10.0, 20.0, -30.0));
        assert_eq!(b.extent(), DVec3::new(1.0, 2.0, 3.0));
    }
}
