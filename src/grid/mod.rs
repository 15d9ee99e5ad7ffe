//! Uniform cell hash grid over a generational element store.
//!
//! Coordinates are unbounded signed lattice triples; a world location maps
//! to the cell whose centre is nearest (round, not floor). Cells are
//! created on first use and keep their geometric bounds; the envelope box
//! grows to cover every cell ever occupied and never shrinks.

mod slot_map;

pub use slot_map::{ElementId, SlotMap};

use glam::{DVec3, IVec3};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::geometry::{round_vec_to_cell, Aabb, Bounds};
use crate::semantics::{cell_extent, half_cell_size, GridSemantics};

/// Inclusive cube of lattice offsets `[-step, step]` per axis.
///
/// Iteration order is z-major then y then x, and is part of the observable
/// (deterministic) ordering of query results.
#[derive(Clone, Copy, Debug)]
pub struct CellRange {
    step: IVec3,
}

impl CellRange {
    pub fn new(step: i32) -> Self {
        Self {
            step: IVec3::splat(step.abs()),
        }
    }

    pub fn with_steps(step: IVec3) -> Self {
        Self { step: step.abs() }
    }

    /// Number of offsets in the cube.
    pub fn count(&self) -> usize {
        let s = self.step;
        (s.x as usize * 2 + 1) * (s.y as usize * 2 + 1) * (s.z as usize * 2 + 1)
    }

    pub fn for_each<F: FnMut(IVec3)>(&self, mut func: F) {
        for z in -self.step.z..=self.step.z {
            for y in -self.step.y..=self.step.y {
                for x in -self.step.x..=self.step.x {
                    func(IVec3::new(x, y, z));
                }
            }
        }
    }

    /// Like [`CellRange::for_each`] with every offset shifted by `offset`.
    pub fn for_each_offset<F: FnMut(IVec3)>(&self, offset: IVec3, mut func: F) {
        self.for_each(|index| func(index + offset));
    }
}

/// An element as stored by the grid: host cell, bounds, and caller payload.
pub struct Element<D> {
    cell: IVec3,
    bounds: Bounds,
    data: D,
}

impl<D> Element<D> {
    /// Coordinate of the cell currently holding this element.
    #[inline]
    pub fn cell(&self) -> IVec3 {
        self.cell
    }

    #[inline]
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    #[inline]
    pub fn data(&self) -> &D {
        &self.data
    }
}

/// One occupied lattice cell: member ids plus fixed geometric bounds.
pub struct Cell {
    elements: FxHashSet<ElementId>,
    bounds: Aabb,
}

impl Cell {
    /// Geometric bounds: cell centre plus a half-cell in every direction.
    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    #[inline]
    pub fn has_elements(&self) -> bool {
        !self.elements.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains(&id)
    }

    pub fn element_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().copied()
    }

    /// Visit every live member through the owning grid's element store.
    ///
    /// Tolerates ids whose element has been removed but not yet erased from
    /// the cell; those are skipped.
    pub fn for_each_element<S, F>(&self, grid: &SpatialGrid<S>, mut func: F)
    where
        S: GridSemantics,
        F: FnMut(ElementId, &Element<S::ElementData>),
    {
        for &id in &self.elements {
            grid.elements.apply_at(id, |id, element| func(id, element));
        }
    }
}

/// Occupancy statistics, mostly for logs and benches.
#[derive(Debug)]
pub struct GridStats {
    pub num_cells: usize,
    pub num_elements: usize,
    pub min_elements_per_cell: usize,
    pub max_elements_per_cell: usize,
    pub empty_cells: usize,
    pub avg_elements_per_cell: f64,
}

/// The spatial index aggregate.
///
/// All mutation takes `&mut self`; reads take `&self` and no locks. Sharing
/// a grid across threads means wrapping it in a lock at the call site and
/// keeping reader and writer phases disjoint.
pub struct SpatialGrid<S: GridSemantics> {
    origin: DVec3,
    elements: SlotMap<Element<S::ElementData>>,
    cells: FxHashMap<IVec3, Cell>,
    envelope: Aabb,
}

impl<S: GridSemantics> SpatialGrid<S> {
    const SEMANTICS_OK: () = {
        assert!(S::CELL_SIZE > 0.0, "cell size must be greater than zero");
        assert!(
            S::MAX_ELEMENT_RADIUS < S::CELL_SIZE * 0.5,
            "max element radius must be less than half the cell size"
        );
    };

    pub fn new() -> Self {
        Self::with_origin(DVec3::ZERO)
    }

    /// Grid whose lattice is anchored at `origin` (the centre of cell
    /// `(0, 0, 0)`).
    pub fn with_origin(origin: DVec3) -> Self {
        let () = Self::SEMANTICS_OK;
        Self {
            origin,
            elements: SlotMap::new(),
            cells: FxHashMap::default(),
            envelope: Aabb::EMPTY,
        }
    }

    /// Grid with element storage preallocated for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        let () = Self::SEMANTICS_OK;
        Self {
            origin: DVec3::ZERO,
            elements: SlotMap::with_capacity(capacity),
            cells: FxHashMap::default(),
            envelope: Aabb::EMPTY,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        S::CELL_SIZE
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// Box covering every cell that ever held an element. Never shrinks,
    /// not even when cells are reclaimed; rebuild the grid for a tight fit.
    #[inline]
    pub fn envelope(&self) -> &Aabb {
        &self.envelope
    }

    /// Coordinate of the cell whose centre is nearest to `location`.
    #[inline]
    pub fn location_to_coord(&self, location: DVec3) -> IVec3 {
        round_vec_to_cell((location - self.origin) / S::CELL_SIZE)
    }

    /// World-space centre of the cell at `coord`.
    #[inline]
    pub fn cell_center(&self, coord: IVec3) -> DVec3 {
        self.origin + coord.as_dvec3() * S::CELL_SIZE
    }

    /// Whether the cell's centre lies inside the envelope. Used by segment
    /// traversal to detect walking off the populated region.
    #[inline]
    pub fn is_cell_within_envelope(&self, coord: IVec3) -> bool {
        self.envelope.contains_point(self.cell_center(coord))
    }

    /// Store an element and register it with its host cell.
    ///
    /// Panics when the bounds radius reaches half a cell; such an element
    /// could overlap cells beyond the immediate neighbourhood and every
    /// query would silently miss it.
    pub fn add_element(&mut self, bounds: Bounds, data: S::ElementData) -> ElementId {
        assert!(
            bounds.radius() < half_cell_size::<S>(),
            "element radius must be less than half the cell size"
        );

        let coord = self.location_to_coord(bounds.origin);
        let id = self.elements.insert(Element {
            cell: coord,
            bounds,
            data,
        });
        self.find_or_add_cell(coord).elements.insert(id);
        id
    }

    /// Remove an element. Stale handles are a no-op.
    ///
    /// The host cell is left in place even when it becomes empty; reclaim
    /// is deferred to [`SpatialGrid::clear_empty_cells`].
    pub fn remove_element(&mut self, id: ElementId) {
        if let Some(element) = self.elements.remove(id) {
            if let Some(cell) = self.cells.get_mut(&element.cell) {
                cell.elements.remove(&id);
            }
        }
    }

    /// Move an element to `new_location`. Stale handles are a no-op.
    ///
    /// Same-cell moves only rewrite the bounds origin; cell crossings also
    /// migrate the id between cell sets, creating the target cell if
    /// needed.
    pub fn update_element_location(&mut self, id: ElementId, new_location: DVec3) {
        let new_coord = self.location_to_coord(new_location);
        let Some(element) = self.elements.get_mut(id) else {
            return;
        };

        element.bounds.origin = new_location;
        if new_coord == element.cell {
            return;
        }

        let prev_coord = element.cell;
        element.cell = new_coord;

        if let Some(prev_cell) = self.cells.get_mut(&prev_coord) {
            prev_cell.elements.remove(&id);
        }
        self.find_or_add_cell(new_coord).elements.insert(id);
    }

    /// Drop every cell whose element set is empty. The envelope keeps its
    /// size.
    pub fn clear_empty_cells(&mut self) {
        let before = self.cells.len();
        self.cells.retain(|_, cell| cell.has_elements());
        let dropped = before - self.cells.len();
        if dropped > 0 {
            log::debug!("reclaimed {} empty cells", dropped);
        }
    }

    pub fn get_cell(&self, coord: IVec3) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    pub fn get_element(&self, id: ElementId) -> Option<&Element<S::ElementData>> {
        self.elements.get(id)
    }

    pub fn contains_element(&self, id: ElementId) -> bool {
        self.elements.contains(id)
    }

    pub fn for_each_cell<F: FnMut(IVec3, &Cell)>(&self, mut func: F) {
        for (&coord, cell) in &self.cells {
            func(coord, cell);
        }
    }

    pub fn for_each_element<F: FnMut(ElementId, &Element<S::ElementData>)>(&self, mut func: F) {
        for (id, element) in self.elements.iter() {
            func(id, element);
        }
    }

    pub fn stats(&self) -> GridStats {
        let mut min_elements = usize::MAX;
        let mut max_elements = 0usize;
        let mut empty = 0usize;

        for cell in self.cells.values() {
            let count = cell.len();
            min_elements = min_elements.min(count);
            max_elements = max_elements.max(count);
            if count == 0 {
                empty += 1;
            }
        }

        GridStats {
            num_cells: self.cells.len(),
            num_elements: self.elements.len(),
            min_elements_per_cell: if self.cells.is_empty() { 0 } else { min_elements },
            max_elements_per_cell: max_elements,
            empty_cells: empty,
            avg_elements_per_cell: if self.cells.is_empty() {
                0.0
            } else {
                self.elements.len() as f64 / self.cells.len() as f64
            },
        }
    }

    fn find_or_add_cell(&mut self, coord: IVec3) -> &mut Cell {
        let origin = self.origin;
        let envelope = &mut self.envelope;
        self.cells.entry(coord).or_insert_with(|| {
            let center = origin + coord.as_dvec3() * S::CELL_SIZE;
            let bounds = Aabb::from_center_extent(center, cell_extent::<S>());
            *envelope = envelope.union(&bounds);
            Cell {
                elements: FxHashSet::default(),
                bounds,
            }
        })
    }
}

impl<S: GridSemantics> Default for SpatialGrid<S> {
    fn default() -> Self {
        Self::new()
    }
}
