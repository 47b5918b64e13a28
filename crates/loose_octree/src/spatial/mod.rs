//! Spatial partitioning data structures
//!
//! A dynamic loose octree storing AABBs tagged with opaque handles, plus the
//! helpers callers build on top of it.

mod context;
mod filter;
mod handle;
mod node;
mod tree;

pub use context::{Bounded, BoundsSource, SpatialContext};
pub use filter::retain_innermost;
pub use handle::Handle;
pub use node::{OctreeNode, StoredEntry, SPLIT_THRESHOLD};
pub use tree::{LooseOctree, MAX_GROWTH_ATTEMPTS};
