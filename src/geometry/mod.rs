mod aabb;
mod bounds;
mod intersect;

pub use aabb::Aabb;
pub use bounds::{Bounds, Shape};
pub use intersect::{
    box_intersects_box, box_intersects_sphere, box_intersects_sphere_sq, line_box_hit_point,
    line_intersects_box, line_intersects_sphere, line_sphere_hit_point, round_vec_to_cell,
};
