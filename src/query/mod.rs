//! Spherical region queries.
//!
//! A query is built once from a radius and then bound to any number of
//! origins. The cached form classifies every cell offset in the bounding
//! cube of the sphere, relative to the query origin's own cell:
//!
//! - **inner**: the cell lies entirely inside the sphere no matter where
//!   in its own cell the origin sits. Members are emitted with no tests.
//! - **edge**: the cell may straddle the surface. Members get the
//!   per-element sphere test.
//! - **outer**: the shell of the bounding cube. The cell's box is tested
//!   against the sphere first, then members individually.
//!
//! The classification depends only on the radius and the cell size, so it
//! is computed once and reused across origins. The on-demand form skips
//! the precomputation and cell-tests every offset instead.
//!
//! Queries are sphere-shaped only.


use std::marker::PhantomData;

use glam::{DVec3, IVec3};

use crate::geometry::box_intersects_sphere_sq;
use crate::grid::{CellRange, Element, ElementId, SpatialGrid};
use crate::semantics::{cell_extent, half_diagonal, GridSemantics};
use crate::util::Timed;

/// Builder for sphere region queries.
///
/// The default radius is one cell size.
pub struct SphereQueryBuilder<S: GridSemantics> {
    radius: f64,
    _semantics: PhantomData<S>,
}

impl<S: GridSemantics> SphereQueryBuilder<S> {
    pub fn new() -> Self {
        Self {
            radius: S::CELL_SIZE,
            _semantics: PhantomData,
        }
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Precompute the inner/edge/outer classification for this radius.
    pub fn build_cached(self) -> SphereQuery<S> {
        let _t = Timed::debug("sphere query cache build");

        let radius = self.radius;
        let mut query = SphereQuery {
            radius,
            inner_cells: Vec::new(),
            edge_cells: Vec::new(),
            outer_cells: Vec::new(),
            _semantics: PhantomData,
        };

        let bounds = (radius / S::CELL_SIZE).round() as i32 + 1;
        let extent = cell_extent::<S>();
        // Shrink the radius by the worst-case distance between the origin
        // and its own cell centre, so "inner" holds for any origin within
        // the centre cell. Clamped at zero: tiny radii have no inner cells.
        let effective_radius = (radius - half_diagonal::<S>()).max(0.0);
        let effective_radius_sq = effective_radius * effective_radius;

        CellRange::new(bounds).for_each(|index| {
            let cell_center = index.as_dvec3() * S::CELL_SIZE;

            // Far corner of the cell as seen from the origin cell.
            let farthest = DVec3::new(
                if cell_center.x > 0.0 { cell_center.x + extent.x } else { cell_center.x - extent.x },
                if cell_center.y > 0.0 { cell_center.y + extent.y } else { cell_center.y - extent.y },
                if cell_center.z > 0.0 { cell_center.z + extent.z } else { cell_center.z - extent.z },
            );

            if farthest.length_squared() <= effective_radius_sq {
                query.inner_cells.push(index);
            } else if index.x.abs() < bounds && index.y.abs() < bounds && index.z.abs() < bounds {
                query.edge_cells.push(index);
            } else {
                query.outer_cells.push(index);
            }
        });

        query
    }

    /// Skip precomputation; every invocation walks the offset cube.
    pub fn build_on_demand(self) -> SphereQueryOnDemand<S> {
        SphereQueryOnDemand {
            radius: self.radius,
            _semantics: PhantomData,
        }
    }
}

impl<S: GridSemantics> Default for SphereQueryBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Sphere region query with a precomputed cell classification.
///
/// Independent of any particular origin or grid; bind it with
/// [`SphereQuery::at`].
pub struct SphereQuery<S: GridSemantics> {
    radius: f64,
    inner_cells: Vec<IVec3>,
    edge_cells: Vec<IVec3>,
    outer_cells: Vec<IVec3>,
    _semantics: PhantomData<S>,
}

impl<S: GridSemantics> SphereQuery<S> {
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Total number of cells this query would visit.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.inner_cells.len() + self.edge_cells.len() + self.outer_cells.len()
    }

    /// Bind the query to an origin.
    pub fn at(&self, origin: DVec3) -> QueryIter<'_, S> {
        QueryIter {
            query: self,
            origin,
        }
    }
}

/// A [`SphereQuery`] bound to a specific origin.
pub struct QueryIter<'q, S: GridSemantics> {
    query: &'q SphereQuery<S>,
    origin: DVec3,
}

impl<S: GridSemantics> QueryIter<'_, S> {
    /// Visit every element whose bounds overlap the sphere.
    ///
    /// Emission order is unspecified but deterministic for a given grid
    /// state. When the precomputed cube would visit more cells than the
    /// grid holds, the whole grid is scanned instead.
    pub fn each<F>(&self, grid: &SpatialGrid<S>, mut func: F)
    where
        F: FnMut(ElementId, &Element<S::ElementData>),
    {
        let radius = self.query.radius;
        if radius <= 0.0 {
            return;
        }
        let radius_sq = radius * radius;
        let origin = self.origin;
        let offset = grid.location_to_coord(origin);

        if self.query.cell_count() > grid.num_cells() {
            scan_whole_grid(grid, origin, radius, radius_sq, &mut func);
            return;
        }

        for &cell_coord in &self.query.inner_cells {
            if let Some(cell) = grid.get_cell(cell_coord + offset) {
                if cell.has_elements() {
                    cell.for_each_element(grid, |id, element| func(id, element));
                }
            }
        }

        for &cell_coord in &self.query.edge_cells {
            if let Some(cell) = grid.get_cell(cell_coord + offset) {
                cell.for_each_element(grid, |id, element| {
                    if element.bounds().overlaps_sphere(origin, radius) {
                        func(id, element);
                    }
                });
            }
        }

        for &cell_coord in &self.query.outer_cells {
            if let Some(cell) = grid.get_cell(cell_coord + offset) {
                if box_intersects_sphere_sq(cell.bounds(), origin, radius_sq) {
                    cell.for_each_element(grid, |id, element| {
                        if element.bounds().overlaps_sphere(origin, radius) {
                            func(id, element);
                        }
                    });
                }
            }
        }
    }
}

/// Sphere region query without a cached classification.
pub struct SphereQueryOnDemand<S: GridSemantics> {
    radius: f64,
    _semantics: PhantomData<S>,
}

impl<S: GridSemantics> SphereQueryOnDemand<S> {
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Bind the query to an origin.
    pub fn at(&self, origin: DVec3) -> OnDemandQueryIter<'_, S> {
        OnDemandQueryIter {
            query: self,
            origin,
        }
    }
}

/// A [`SphereQueryOnDemand`] bound to a specific origin.
pub struct OnDemandQueryIter<'q, S: GridSemantics> {
    query: &'q SphereQueryOnDemand<S>,
    origin: DVec3,
}

impl<S: GridSemantics> OnDemandQueryIter<'_, S> {
    /// Visit every element whose bounds overlap the sphere.
    ///
    /// Every cell of the bounding cube gets the cell-level sphere test,
    /// then members get the per-element test. Falls back to a whole-grid
    /// scan when the cube is larger than the grid.
    pub fn each<F>(&self, grid: &SpatialGrid<S>, mut func: F)
    where
        F: FnMut(ElementId, &Element<S::ElementData>),
    {
        let radius = self.query.radius;
        if radius <= 0.0 {
            return;
        }
        let radius_sq = radius * radius;
        let origin = self.origin;

        let cell_range = CellRange::new((radius / S::CELL_SIZE).round() as i32 + 1);
        let offset = grid.location_to_coord(origin);

        if cell_range.count() > grid.num_cells() {
            scan_whole_grid(grid, origin, radius, radius_sq, &mut func);
            return;
        }

        cell_range.for_each_offset(offset, |cell_coord| {
            if let Some(cell) = grid.get_cell(cell_coord) {
                if box_intersects_sphere_sq(cell.bounds(), origin, radius_sq) {
                    cell.for_each_element(grid, |id, element| {
                        if element.bounds().overlaps_sphere(origin, radius) {
                            func(id, element);
                        }
                    });
                }
            }
        });
    }
}

fn scan_whole_grid<S, F>(
    grid: &SpatialGrid<S>,
    origin: DVec3,
    radius: f64,
    radius_sq: f64,
    func: &mut F,
) where
    S: GridSemantics,
    F: FnMut(ElementId, &Element<S::ElementData>),
{
    grid.for_each_cell(|_, cell| {
        if box_intersects_sphere_sq(cell.bounds(), origin, radius_sq) {
            cell.for_each_element(grid, |id, element| {
                if element.bounds().overlaps_sphere(origin, radius) {
                    func(id, element);
                }
            });
        }
    });
}
