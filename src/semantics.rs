//! Compile-time grid configuration.

use glam::DVec3;

/// Compile-time parameters binding a grid to its element domain.
///
/// Implementations are usually zero-sized marker types. Every implementation
/// monomorphises its own [`SpatialGrid`](crate::SpatialGrid),
/// [`SphereQuery`](crate::SphereQuery), and [`LineTrace`](crate::LineTrace)
/// types, so the cell size and radius cap are constants on the hot paths.
///
/// `CELL_SIZE > 0` and `MAX_ELEMENT_RADIUS < CELL_SIZE / 2` are checked at
/// compile time when the first grid for the semantics is constructed.
pub trait GridSemantics {
    /// Edge length of one grid cell, in world units.
    const CELL_SIZE: f64;

    /// Upper bound on element radius. Must stay below half a cell so an
    /// element can only overlap the 3x3x3 neighbourhood of its host cell.
    const MAX_ELEMENT_RADIUS: f64;

    /// Caller payload carried by each element.
    type ElementData;
}

pub(crate) const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Half of one cell edge.
#[inline]
pub const fn half_cell_size<S: GridSemantics>() -> f64 {
    S::CELL_SIZE * 0.5
}

/// Distance from a cell centre to any of its corners.
#[inline]
pub const fn half_diagonal<S: GridSemantics>() -> f64 {
    half_cell_size::<S>() * SQRT_3
}

/// Half-size vector of one cell.
#[inline]
pub fn cell_extent<S: GridSemantics>() -> DVec3 {
    DVec3::splat(half_cell_size::<S>())
}
