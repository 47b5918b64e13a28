//! Geometric primitives used by the spatial index
//!
//! Axis-aligned boxes, rays and frustum planes, along with the
//! intersection tests the octree runs against node and entry bounds.

mod aabb;
mod frustum;
mod ray;

pub use aabb::AABB;
pub use frustum::{planes_intersect_aabb, Frustum, Plane};
pub use ray::Ray;
