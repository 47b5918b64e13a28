//! Loose octree facade
//!
//! Owns the root node, keeps a running entry count and grows or shrinks the
//! root as content moves outside of, or away from, its current bounds.

use log::{debug, error, warn};

use crate::config::OctreeConfig;
use crate::error::{OctreeError, OctreeResult};
use crate::foundation::math::Vec3;
use crate::geometry::{Plane, Ray, AABB};
use super::node::{grown_geometry, loose_bounds, octant_offset, OctreeNode};
use super::Handle;

/// Growth steps a single insert may take before it is abandoned
pub const MAX_GROWTH_ATTEMPTS: usize = 20;

/// Dynamic loose octree of handles tagged with AABBs
///
/// Entries are never refit: an object that moves or changes size must be
/// removed and reinserted by the caller.
#[derive(Debug, Clone)]
pub struct LooseOctree<H> {
    /// Root node; replaced on grow and shrink
    root: OctreeNode<H>,
    /// Total entries across the whole tree
    count: usize,
    /// Edge length of the initial root
    initial_size: f32,
    /// Center of the initial root
    initial_center: Vec3,
    /// Nodes never split into children smaller than this
    min_size: f32,
    /// Loose bounds multiplier in [1.0, 2.0]
    looseness: f32,
}

impl<H: Handle> LooseOctree<H> {
    /// Create a new octree
    ///
    /// `looseness` is clamped to [1.0, 2.0]. A `min_node_size` larger than
    /// `initial_size` is lowered to `initial_size`.
    pub fn new(initial_size: f32, initial_center: Vec3, min_node_size: f32, looseness: f32) -> Self {
        let mut min_size = min_node_size;
        if min_node_size > initial_size {
            warn!(
                "Minimum node size must be at least as big as the initial world size. Was: {} Adjusted to: {}",
                min_node_size, initial_size
            );
            min_size = initial_size;
        }

        let clamped = if looseness.is_nan() { 1.0 } else { looseness.clamp(1.0, 2.0) };
        if !(1.0..=2.0).contains(&looseness) {
            warn!("Looseness {} out of range, clamped to {}", looseness, clamped);
        }

        Self {
            root: OctreeNode::new(initial_size, min_size, clamped, initial_center),
            count: 0,
            initial_size,
            initial_center,
            min_size,
            looseness: clamped,
        }
    }

    /// Create an octree from a configuration
    pub fn from_config(config: &OctreeConfig) -> Self {
        Self::new(config.initial_size, config.center(), config.min_node_size, config.looseness)
    }

    /// Number of entries in the tree
    pub fn count(&self) -> usize {
        self.count
    }

    /// Check if the tree holds no entries
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Edge length the tree was created with
    pub fn initial_size(&self) -> f32 {
        self.initial_size
    }

    /// Minimum node size after construction-time correction
    pub fn min_node_size(&self) -> f32 {
        self.min_size
    }

    /// Looseness after clamping
    pub fn looseness(&self) -> f32 {
        self.looseness
    }

    /// The current root node
    pub fn root(&self) -> &OctreeNode<H> {
        &self.root
    }

    /// Loose bounds of the current root
    pub fn max_bounds(&self) -> AABB {
        *self.root.bounds()
    }

    /// Loose bounds of every node, root first (for visualization)
    pub fn node_bounds(&self) -> Vec<AABB> {
        let mut bounds = Vec::new();
        self.root.collect_bounds(&mut bounds);
        bounds
    }

    /// Insert an entry, growing the root until it fits
    ///
    /// Growth is planned before anything changes: if the bounds cannot be
    /// enclosed within [`MAX_GROWTH_ATTEMPTS`] steps the tree is left as it
    /// was and [`OctreeError::GrowthExhausted`] is returned.
    pub fn insert(&mut self, handle: H, bounds: AABB) -> OctreeResult<()> {
        let steps = self
            .plan_growth(&bounds)
            .ok_or_else(|| self.growth_exhausted(bounds))?;

        for _ in 0..steps {
            self.grow(bounds.center() - self.root.center())?;
        }

        if !self.root.add(handle, bounds) {
            return Err(self.growth_exhausted(bounds));
        }

        self.count += 1;
        Ok(())
    }

    /// Remove an entry, searching the whole tree
    pub fn remove(&mut self, handle: H) -> bool {
        let removed = self.root.remove(handle);
        if removed {
            self.count -= 1;
            self.shrink();
        }
        removed
    }

    /// Remove an entry inserted with (or still enclosed by) `bounds`
    ///
    /// Faster than [`remove`](Self::remove) because only the branch those
    /// bounds would have been placed in is searched.
    pub fn remove_with_bounds(&mut self, handle: H, bounds: &AABB) -> bool {
        let removed = self.root.remove_with_bounds(handle, bounds);
        if removed {
            self.count -= 1;
            self.shrink();
        }
        removed
    }

    /// Check if any entry overlaps `query`
    pub fn is_colliding(&self, query: &AABB) -> bool {
        self.root.is_colliding(query)
    }

    /// Check if the ray hits any entry within `max_distance`
    pub fn is_colliding_ray(&self, ray: &Ray, max_distance: f32) -> bool {
        self.root.is_colliding_ray(ray, max_distance)
    }

    /// Handles of every entry overlapping `query`
    pub fn get_colliding(&self, query: &AABB) -> Vec<H> {
        let mut results = Vec::new();
        self.get_colliding_into(query, &mut results);
        results
    }

    /// Append handles of every entry overlapping `query` to `results`
    pub fn get_colliding_into(&self, query: &AABB, results: &mut Vec<H>) {
        self.root.get_colliding(query, results);
    }

    /// Handles of every entry the ray hits within `max_distance`
    ///
    /// An object nested inside another is reported along with its container.
    /// See [`retain_innermost`](super::retain_innermost) to drop containers.
    pub fn get_colliding_ray(&self, ray: &Ray, max_distance: f32) -> Vec<H> {
        let mut results = Vec::new();
        self.get_colliding_ray_into(ray, max_distance, &mut results);
        results
    }

    /// Append handles of every entry the ray hits within `max_distance`
    pub fn get_colliding_ray_into(&self, ray: &Ray, max_distance: f32, results: &mut Vec<H>) {
        self.root.get_colliding_ray(ray, max_distance, results);
    }

    /// Handles of every entry touched by a sphere of `radius` swept along the ray
    pub fn get_colliding_ray_with_radius(&self, ray: &Ray, radius: f32, max_distance: f32) -> Vec<H> {
        let mut results = Vec::new();
        self.get_colliding_ray_with_radius_into(ray, radius, max_distance, &mut results);
        results
    }

    /// Append handles touched by a sphere of `radius` swept along the ray
    pub fn get_colliding_ray_with_radius_into(
        &self,
        ray: &Ray,
        radius: f32,
        max_distance: f32,
        results: &mut Vec<H>,
    ) {
        self.root.get_colliding_ray_with_radius(ray, radius, max_distance, results);
    }

    /// Handles of every entry not fully excluded by any of `planes`
    pub fn get_within_frustum(&self, planes: &[Plane]) -> Vec<H> {
        let mut results = Vec::new();
        self.get_within_frustum_into(planes, &mut results);
        results
    }

    /// Append handles of every entry not fully excluded by any of `planes`
    pub fn get_within_frustum_into(&self, planes: &[Plane], results: &mut Vec<H>) {
        self.root.get_within_frustum(planes, results);
    }

    /// Drop every entry and return to the initial root
    pub fn clear(&mut self) {
        self.root = OctreeNode::new(self.initial_size, self.min_size, self.looseness, self.initial_center);
        self.count = 0;
    }

    /// Growth steps needed before `bounds` fits the root, if within the limit
    fn plan_growth(&self, bounds: &AABB) -> Option<usize> {
        let mut center = self.root.center();
        let mut length = self.root.base_length();

        for steps in 0..=MAX_GROWTH_ATTEMPTS {
            if loose_bounds(center, length, self.looseness).contains_aabb(bounds) {
                return Some(steps);
            }
            (center, length) = grown_geometry(center, length, bounds.center() - center);
        }

        None
    }

    fn growth_exhausted(&self, bounds: AABB) -> OctreeError {
        error!(
            "Aborted insert as it seemed to be going on forever ({}) attempts at growing the octree; bounds {:?}",
            MAX_GROWTH_ATTEMPTS, bounds
        );
        OctreeError::GrowthExhausted { attempts: MAX_GROWTH_ATTEMPTS, bounds }
    }

    /// Double the root toward `direction`, keeping the old root as a child
    fn grow(&mut self, direction: Vec3) -> OctreeResult<()> {
        let old_center = self.root.center();
        let old_length = self.root.base_length();
        let (new_center, new_length) = grown_geometry(old_center, old_length, direction);
        let mut new_root = OctreeNode::new(new_length, self.min_size, self.looseness, new_center);

        if self.root.has_any_objects() {
            let root_octant = new_root.best_fit_child(&old_center);
            let half = old_length / 2.0;
            let mut children: Vec<OctreeNode<H>> = (0..8)
                .map(|octant| {
                    OctreeNode::new(old_length, self.min_size, self.looseness, new_center + octant_offset(octant) * half)
                })
                .collect();
            std::mem::swap(&mut children[root_octant], &mut self.root);
            new_root.set_children(children)?;
        }

        debug!(
            "Grew octree root from length {} at {:?} to length {} at {:?}",
            old_length, old_center, new_length, new_center
        );
        self.root = new_root;
        Ok(())
    }

    /// Collapse the root toward the smallest node that still holds everything
    fn shrink(&mut self) {
        let before = self.root.base_length();
        while self.root.shrink_if_possible(self.min_size) {}

        let after = self.root.base_length();
        if after < before {
            debug!("Shrank octree root from length {} to {} at {:?}", before, after, self.root.center());
        }
    }
}
