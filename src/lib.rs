//! Uniform 3D spatial index for volumetric elements in a continuous world.
//!
//! A cell hash grid layered over a generational slot map. Elements carry
//! sphere or box bounds strictly smaller than half a cell, so an element can
//! only ever overlap the 3x3x3 neighbourhood of its host cell. Queries lean
//! on that invariant:
//!
//! - [`SphereQuery`]: region query with a precomputed inner/edge/outer cell
//!   classification, amortised across repeated queries at different origins.
//! - [`LineTrace`]: 3D-DDA segment traversal, first-hit or all-hits.
//!
//! Mutation goes through `&mut self`; reads are plain `&self` and take no
//! locks. Callers that share a grid across threads wrap it in their own lock
//! and keep reader and writer phases disjoint, typically at tick boundaries.
//!
//! Cell size, the element radius cap, and the payload type are bound at
//! compile time through [`GridSemantics`], so every domain gets its own
//! monomorphised grid, query, and trace types.

pub mod geometry;
pub mod grid;
pub mod query;
pub mod semantics;
pub mod trace;
pub mod util;

pub use geometry::{Aabb, Bounds, Shape};
pub use grid::{Cell, CellRange, Element, ElementId, GridStats, SlotMap, SpatialGrid};
pub use query::{
    OnDemandQueryIter, QueryIter, SphereQuery, SphereQueryBuilder, SphereQueryOnDemand,
};
pub use semantics::GridSemantics;
pub use trace::{LineTrace, QueryResult};
