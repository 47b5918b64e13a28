//! Error types for the spatial index

use thiserror::Error;

use crate::config::ConfigError;
use crate::geometry::AABB;

/// Result type for fallible octree operations
pub type OctreeResult<T> = Result<T, OctreeError>;

/// Octree errors
///
/// Only the tree facade and configuration loading report errors; queries and
/// removals resolve to empty or `false` results instead.
#[derive(Error, Debug)]
pub enum OctreeError {
    /// The inserted bounds could not be enclosed by growing the root
    #[error("Insert aborted after {attempts} attempts at growing the octree (bounds {bounds:?})")]
    GrowthExhausted {
        /// Growth steps tried before giving up
        attempts: usize,
        /// Bounds of the rejected entry
        bounds: AABB,
    },

    /// A node was handed a child array that was not exactly eight long
    #[error("Child octree array must be length 8, was length {0}")]
    InvalidChildCount(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
