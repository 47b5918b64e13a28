//! # Loose Octree
//!
//! A dynamic loose octree for broad-phase spatial queries over
//! axis-aligned bounding boxes.
//!
//! ## Features
//!
//! - **Loose Nodes**: Node bounds are scaled by a looseness factor so entries
//!   near cell boundaries still settle deep in the tree
//! - **Dynamic Growth**: The root grows toward entries placed outside it and
//!   shrinks back after removals
//! - **Queries**: AABB overlap, rays, swept-sphere rays and frustum culling
//! - **Opaque Handles**: Entries are tagged with any `Copy` handle, including
//!   `slotmap` keys
//! - **Spatial Context**: An explicitly owned, rebuild-on-demand index
//!
//! ## Quick Start
//!
//! ```rust
//! use loose_octree::prelude::*;
//!
//! fn main() -> Result<(), OctreeError> {
//!     let mut tree: LooseOctree<u32> = LooseOctree::new(16.0, Vec3::zeros(), 1.0, 1.25);
//!
//!     tree.insert(1, AABB::cube(Vec3::new(2.0, 2.0, 2.0), 1.0))?;
//!     tree.insert(2, AABB::cube(Vec3::new(90.0, 0.0, 0.0), 1.0))?;
//!
//!     let hits = tree.get_colliding(&AABB::cube(Vec3::new(2.0, 2.0, 2.0), 0.5));
//!     assert_eq!(hits, vec![1]);
//!
//!     let ray = Ray::new(Vec3::new(-10.0, 2.0, 2.0), Vec3::new(1.0, 0.0, 0.0));
//!     assert!(tree.is_colliding_ray(&ray, 100.0));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod geometry;
pub mod spatial;

mod error;

pub use error::{OctreeError, OctreeResult};

/// Common imports for octree users
pub mod prelude {
    pub use crate::{
        OctreeError, OctreeResult,
        config::{Config, OctreeConfig},
        foundation::math::{Vec3, Mat4},
        geometry::{AABB, Frustum, Plane, Ray},
        spatial::{
            retain_innermost, Bounded, BoundsSource, Handle, LooseOctree, SpatialContext,
        },
    };
}
