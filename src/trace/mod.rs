//! Segment traversal over the grid via 3D DDA.
//!
//! The segment is first clipped against the grid envelope, then cells are
//! walked in order of parametric entry: step along whichever axis crosses
//! its next cell boundary soonest. At every visited cell the full 3x3x3
//! neighbourhood is swept, because an element whose origin sits in a
//! neighbour cell can still overlap the current one (element radius is
//! capped below half a cell, so overlap never reaches further). A visited
//! set keeps the sweep from re-testing cells shared between consecutive
//! neighbourhoods.


use std::marker::PhantomData;

use glam::{DVec3, IVec3};
use rustc_hash::FxHashSet;

use crate::geometry::{line_box_hit_point, line_intersects_box};
use crate::grid::{CellRange, Element, ElementId, SpatialGrid};
use crate::semantics::{cell_extent, GridSemantics};

/// Location reported by a [`QueryResult`] that hit nothing.
pub const INVALID_LOCATION: DVec3 = DVec3::splat(f64::MAX);

/// Outcome of a first-hit trace.
#[derive(Clone, Copy, Debug)]
pub struct QueryResult {
    /// Whether anything was hit.
    pub blocking_hit: bool,
    /// Impact point on a hit; segment end when the traversal ran through;
    /// [`INVALID_LOCATION`] when the segment missed the envelope.
    pub location: DVec3,
    pub impact_point: DVec3,
    /// Carried for callers that derive a surface normal from the payload;
    /// the traversal itself never fills it in.
    pub impact_normal: DVec3,
    pub element_id: ElementId,
}

impl Default for QueryResult {
    fn default() -> Self {
        Self {
            blocking_hit: false,
            location: INVALID_LOCATION,
            impact_point: INVALID_LOCATION,
            impact_normal: DVec3::ZERO,
            element_id: ElementId::default(),
        }
    }
}

/// A segment prepared for traversal: direction, reciprocals, and per-axis
/// DDA increments are computed once at construction.
pub struct LineTrace<S: GridSemantics> {
    start: DVec3,
    end: DVec3,
    dir: DVec3,
    inv_dir: DVec3,
    /// Parametric distance to cross one cell along each axis.
    delta: DVec3,
    /// Lattice step per axis, +1 or -1.
    step: IVec3,
    _semantics: PhantomData<S>,
}

impl<S: GridSemantics> LineTrace<S> {
    pub fn new(start: DVec3, end: DVec3) -> Self {
        Self::with_dir(start, end, (end - start).normalize_or_zero())
    }

    /// Trace from `start` along a unit `direction` for `length` units.
    pub fn from_direction(start: DVec3, direction: DVec3, length: f64) -> Self {
        Self::with_dir(start, start + direction * length, direction)
    }

    fn with_dir(start: DVec3, end: DVec3, dir: DVec3) -> Self {
        let inv_dir = dir.recip();
        Self {
            start,
            end,
            dir,
            inv_dir,
            delta: (inv_dir * S::CELL_SIZE).abs(),
            step: IVec3::new(
                if dir.x > 0.0 { 1 } else { -1 },
                if dir.y > 0.0 { 1 } else { -1 },
                if dir.z > 0.0 { 1 } else { -1 },
            ),
            _semantics: PhantomData,
        }
    }

    /// Visit every element whose bounds the segment crosses, in no
    /// particular order. `func` receives the id, the element, and the
    /// segment's entry point into its bounds.
    pub fn multi<F>(&self, grid: &SpatialGrid<S>, mut func: F)
    where
        F: FnMut(ElementId, &Element<S::ElementData>, DVec3),
    {
        if self.dir == DVec3::ZERO {
            return;
        }
        let Some(hit_point) =
            line_box_hit_point(grid.envelope(), self.start, self.end, self.dir, self.inv_dir)
        else {
            return;
        };

        let mut checked_cells = FxHashSet::default();
        let mut current_cell = grid.location_to_coord(hit_point);
        let end_cell = grid.location_to_coord(self.end);
        let mut t_max = self.initial_t_max(grid, current_cell, hit_point);

        // An envelope entry from outside starts in a boundary cell whose
        // neighbourhood holds nothing closer to the start; step inward once.
        if hit_point != self.start {
            self.progress(&mut current_cell, &mut t_max);
        }

        let max_steps = self.max_steps(hit_point);
        for _ in 0..max_steps {
            self.check_all(grid, current_cell, &mut checked_cells, &mut func);

            if current_cell == end_cell || !grid.is_cell_within_envelope(current_cell) {
                break;
            }

            self.progress(&mut current_cell, &mut t_max);
        }
    }

    /// Closest hit along the segment, or a default result on a miss.
    pub fn single(&self, grid: &SpatialGrid<S>) -> QueryResult {
        let mut result = QueryResult::default();

        if self.dir == DVec3::ZERO {
            return result;
        }
        let Some(hit_point) =
            line_box_hit_point(grid.envelope(), self.start, self.end, self.dir, self.inv_dir)
        else {
            return result;
        };

        let mut checked_cells = FxHashSet::default();
        let mut current_cell = grid.location_to_coord(hit_point);
        let end_cell = grid.location_to_coord(self.end);
        let mut t_max = self.initial_t_max(grid, current_cell, hit_point);

        if hit_point != self.start {
            self.progress(&mut current_cell, &mut t_max);
        }

        result.location = self.end;
        let envelope_entry_dist = self.start.distance(hit_point);

        let max_steps = self.max_steps(hit_point);
        for _ in 0..max_steps {
            self.check_closest(grid, current_cell, &mut checked_cells, &mut result);

            if current_cell == end_cell || !grid.is_cell_within_envelope(current_cell) {
                break;
            }

            // A hit can still be superseded by an element whose origin lies
            // further along but whose surface is nearer. Safe to stop once
            // the next cell is entered beyond the best hit so far.
            if result.blocking_hit {
                let next_entry = envelope_entry_dist + t_max.min_element().max(0.0);
                if next_entry * next_entry > self.start.distance_squared(result.impact_point) {
                    break;
                }
            }

            self.progress(&mut current_cell, &mut t_max);
        }

        result
    }

    /// Parametric distance from `hit_point` to the far face of the first
    /// cell along each axis. Axes the segment never crosses get infinity.
    fn initial_t_max(&self, grid: &SpatialGrid<S>, cell: IVec3, hit_point: DVec3) -> DVec3 {
        let cell_origin = grid.cell_center(cell);
        let extent = cell_extent::<S>();
        let t1 = ((cell_origin - extent) - hit_point) * self.inv_dir;
        let t2 = ((cell_origin + extent) - hit_point) * self.inv_dir;
        let t_max = t1.max(t2);

        // 0 * inf on a face-aligned start produces NaN; treat that axis as
        // never crossing.
        DVec3::new(
            if t_max.x.is_nan() { f64::INFINITY } else { t_max.x },
            if t_max.y.is_nan() { f64::INFINITY } else { t_max.y },
            if t_max.z.is_nan() { f64::INFINITY } else { t_max.z },
        )
    }

    /// Step budget: an axis-sum of cells the remaining segment can cross,
    /// plus one. Bounds the walk under numerical edge cases.
    fn max_steps(&self, hit_point: DVec3) -> u32 {
        let delta = self.end - hit_point;
        ((delta.x.abs() / S::CELL_SIZE).ceil()
            + (delta.y.abs() / S::CELL_SIZE).ceil()
            + (delta.z.abs() / S::CELL_SIZE).ceil()) as u32
            + 1
    }

    /// Advance to the neighbouring cell whose boundary the segment crosses
    /// next.
    fn progress(&self, current_cell: &mut IVec3, t_max: &mut DVec3) {
        if t_max.x < t_max.y && t_max.x < t_max.z {
            current_cell.x += self.step.x;
            t_max.x += self.delta.x;
        } else if t_max.y < t_max.z {
            current_cell.y += self.step.y;
            t_max.y += self.delta.y;
        } else {
            current_cell.z += self.step.z;
            t_max.z += self.delta.z;
        }
    }

    fn check_all<F>(
        &self,
        grid: &SpatialGrid<S>,
        offset: IVec3,
        checked_cells: &mut FxHashSet<IVec3>,
        func: &mut F,
    ) where
        F: FnMut(ElementId, &Element<S::ElementData>, DVec3),
    {
        CellRange::new(1).for_each_offset(offset, |coords| {
            if !checked_cells.insert(coords) {
                return;
            }
            let Some(cell) = grid.get_cell(coords) else {
                return;
            };
            if cell.has_elements() && line_intersects_box(cell.bounds(), self.start, self.inv_dir) {
                cell.for_each_element(grid, |id, element| {
                    if let Some(hit) =
                        element
                            .bounds()
                            .line_hit_point(self.start, self.end, self.dir, self.inv_dir)
                    {
                        func(id, element, hit);
                    }
                });
            }
        });
    }

    fn check_closest(
        &self,
        grid: &SpatialGrid<S>,
        offset: IVec3,
        checked_cells: &mut FxHashSet<IVec3>,
        closest: &mut QueryResult,
    ) {
        CellRange::new(1).for_each_offset(offset, |coords| {
            if !checked_cells.insert(coords) {
                return;
            }
            let Some(cell) = grid.get_cell(coords) else {
                return;
            };
            if cell.has_elements() && line_intersects_box(cell.bounds(), self.start, self.inv_dir) {
                cell.for_each_element(grid, |id, element| {
                    let Some(hit) =
                        element
                            .bounds()
                            .line_hit_point(self.start, self.end, self.dir, self.inv_dir)
                    else {
                        return;
                    };
                    let better = !closest.blocking_hit
                        || self.start.distance_squared(hit)
                            < self.start.distance_squared(closest.impact_point);
                    if better {
                        closest.blocking_hit = true;
                        closest.location = hit;
                        closest.impact_point = hit;
                        closest.element_id = id;
                    }
                });
            }
        });
    }
}
