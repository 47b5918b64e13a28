//! Loose octree node
//!
//! Each node covers a cube of `base_length` around its center, but tests
//! entries against loose bounds `looseness` times larger. An entry lives in
//! the deepest node whose loose bounds enclose it; entries straddling the
//! boundary between children stay in the parent. Children are created all
//! eight at once (split) and collapsed back all at once (merge).

use log::{error, trace};

use crate::error::{OctreeError, OctreeResult};
use crate::foundation::math::{utils::sign_or_positive, Vec3};
use crate::geometry::{planes_intersect_aabb, Plane, Ray, AABB};
use super::Handle;

/// Entries a childless node holds before it splits
pub const SPLIT_THRESHOLD: usize = 8;

/// Handle plus the bounds it was inserted with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredEntry<H> {
    /// Opaque object handle
    pub handle: H,
    /// Bounds snapshot taken at insertion time
    pub bounds: AABB,
}

/// Loose bounds of a node: a cube of `base_length * looseness` around `center`
pub(crate) fn loose_bounds(center: Vec3, base_length: f32, looseness: f32) -> AABB {
    AABB::cube(center, base_length * looseness)
}

/// Unit offset (each axis +1 or -1) from a node center to the center of `octant`
///
/// Octant layout:
/// 0: -X, -Y, -Z
/// 1: +X, -Y, -Z
/// 2: -X, +Y, -Z
/// 3: +X, +Y, -Z
/// 4: -X, -Y, +Z
/// 5: +X, -Y, +Z
/// 6: -X, +Y, +Z
/// 7: +X, +Y, +Z
pub(crate) fn octant_offset(octant: usize) -> Vec3 {
    Vec3::new(
        if octant & 1 != 0 { 1.0 } else { -1.0 },
        if octant & 2 != 0 { 1.0 } else { -1.0 },
        if octant & 4 != 0 { 1.0 } else { -1.0 },
    )
}

/// Octant of `point` relative to `center`, matching [`octant_offset`]
pub(crate) fn octant_index(center: &Vec3, point: &Vec3) -> usize {
    let x_bit = usize::from(point.x >= center.x);
    let y_bit = usize::from(point.y >= center.y);
    let z_bit = usize::from(point.z >= center.z);
    (z_bit << 2) | (y_bit << 1) | x_bit
}

/// Geometry of the root after one growth step toward `direction`
pub(crate) fn grown_geometry(center: Vec3, base_length: f32, direction: Vec3) -> (Vec3, f32) {
    let half = base_length / 2.0;
    let step = Vec3::new(
        sign_or_positive(direction.x),
        sign_or_positive(direction.y),
        sign_or_positive(direction.z),
    );
    (center + step * half, base_length * 2.0)
}

/// Single node in the loose octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode<H> {
    /// Center of this node
    center: Vec3,
    /// Edge length before looseness is applied
    base_length: f32,
    /// Loose bounds multiplier
    looseness: f32,
    /// Smallest edge length a child may have
    min_size: f32,
    /// Loose bounds of this node
    bounds: AABB,
    /// Loose bounds of the 8 children, whether or not they exist yet
    child_bounds: [AABB; 8],
    /// Entries that belong to this node directly
    entries: Vec<StoredEntry<H>>,
    /// Child nodes (8 octants), None if this is a leaf
    children: Option<Box<[OctreeNode<H>; 8]>>,
}

impl<H: Handle> OctreeNode<H> {
    /// Create a new leaf node
    pub fn new(base_length: f32, min_size: f32, looseness: f32, center: Vec3) -> Self {
        let mut node = Self {
            center,
            base_length,
            looseness,
            min_size,
            bounds: AABB::new(center, center),
            child_bounds: [AABB::new(center, center); 8],
            entries: Vec::new(),
            children: None,
        };
        node.set_values(base_length, min_size, looseness, center);
        node
    }

    fn set_values(&mut self, base_length: f32, min_size: f32, looseness: f32, center: Vec3) {
        self.center = center;
        self.base_length = base_length;
        self.min_size = min_size;
        self.looseness = looseness;
        self.bounds = loose_bounds(center, base_length, looseness);

        let quarter = base_length / 4.0;
        let child_length = base_length / 2.0;
        self.child_bounds = std::array::from_fn(|octant| {
            loose_bounds(center + octant_offset(octant) * quarter, child_length, looseness)
        });
    }

    /// Center of this node
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Edge length before looseness is applied
    pub fn base_length(&self) -> f32 {
        self.base_length
    }

    /// Loose bounds this node tests entries and queries against
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    /// Entries stored directly in this node
    pub fn entries(&self) -> &[StoredEntry<H>] {
        &self.entries
    }

    /// The eight children, if this node has split
    pub fn children(&self) -> Option<&[OctreeNode<H>; 8]> {
        self.children.as_deref()
    }

    /// Check if this node has children
    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }

    /// Octant (0-7) a point falls into relative to this node's center
    pub fn best_fit_child(&self, point: &Vec3) -> usize {
        octant_index(&self.center, point)
    }

    /// Check if this node or any descendant stores at least one entry
    pub fn has_any_objects(&self) -> bool {
        !self.entries.is_empty()
            || self
                .children
                .as_ref()
                .is_some_and(|children| children.iter().any(Self::has_any_objects))
    }

    /// Count entries in this node and all descendants
    pub fn entry_count(&self) -> usize {
        let mut count = self.entries.len();

        if let Some(children) = &self.children {
            count += children.iter().map(Self::entry_count).sum::<usize>();
        }

        count
    }

    /// Replace this node's children
    ///
    /// Rejects any array that does not hold exactly eight nodes and leaves
    /// the node unchanged in that case.
    pub fn set_children(&mut self, children: Vec<OctreeNode<H>>) -> OctreeResult<()> {
        let len = children.len();
        let children: Box<[OctreeNode<H>; 8]> = children
            .into_boxed_slice()
            .try_into()
            .map_err(|_| {
                error!("Child octree array must be length 8. Was length: {}", len);
                OctreeError::InvalidChildCount(len)
            })?;

        self.children = Some(children);
        Ok(())
    }

    /// Add an entry if it fits inside this node's loose bounds
    pub fn add(&mut self, handle: H, bounds: AABB) -> bool {
        if !self.bounds.contains_aabb(&bounds) {
            return false;
        }

        self.sub_add(StoredEntry { handle, bounds });
        true
    }

    /// Add an entry known to fit, pushing it as deep as it will go
    fn sub_add(&mut self, entry: StoredEntry<H>) {
        if self.children.is_none() {
            if self.entries.len() < SPLIT_THRESHOLD || self.base_length / 2.0 < self.min_size {
                self.entries.push(entry);
                return;
            }

            self.split();

            // Move existing entries down where they fit a single child
            for existing in std::mem::take(&mut self.entries) {
                self.place(existing);
            }
        }

        self.place(entry);
    }

    /// Hand an entry to its best-fit child, or keep it here if it straddles
    fn place(&mut self, entry: StoredEntry<H>) {
        let octant = self.best_fit_child(&entry.bounds.center());

        if self.child_bounds[octant].contains_aabb(&entry.bounds) {
            if let Some(children) = self.children.as_mut() {
                children[octant].sub_add(entry);
                return;
            }
        }

        self.entries.push(entry);
    }

    /// Subdivide this node into 8 children
    fn split(&mut self) {
        let half = self.base_length / 2.0;
        let quarter = self.base_length / 4.0;
        let children = std::array::from_fn(|octant| {
            OctreeNode::new(
                half,
                self.min_size,
                self.looseness,
                self.center + octant_offset(octant) * quarter,
            )
        });

        trace!(
            "Splitting node at {:?} (length {}) holding {} entries",
            self.center, self.base_length, self.entries.len()
        );
        self.children = Some(Box::new(children));
    }

    /// Check if this node and its children together are small enough to collapse
    fn should_merge(&self) -> bool {
        let Some(children) = &self.children else {
            return false;
        };

        let mut total = self.entries.len();
        for child in children.iter() {
            if child.children.is_some() {
                // Grandchildren exist; merge those first
                return false;
            }
            total += child.entries.len();
        }

        total <= SPLIT_THRESHOLD
    }

    /// Pull every child's entries up into this node and drop the children
    fn merge(&mut self) {
        if let Some(children) = self.children.take() {
            trace!("Merging children of node at {:?} (length {})", self.center, self.base_length);
            for mut child in *children {
                self.entries.append(&mut child.entries);
            }
        }
    }

    /// Remove an entry, searching the whole subtree
    pub fn remove(&mut self, handle: H) -> bool {
        let removed = if let Some(index) = self.entries.iter().position(|e| e.handle == handle) {
            self.entries.swap_remove(index);
            true
        } else if let Some(children) = self.children.as_mut() {
            children.iter_mut().any(|child| child.remove(handle))
        } else {
            false
        };

        if removed && self.should_merge() {
            self.merge();
        }

        removed
    }

    /// Remove an entry, only searching where `bounds` could have been placed
    pub fn remove_with_bounds(&mut self, handle: H, bounds: &AABB) -> bool {
        if !self.bounds.contains_aabb(bounds) {
            return false;
        }

        self.sub_remove(handle, bounds)
    }

    fn sub_remove(&mut self, handle: H, bounds: &AABB) -> bool {
        let removed = if let Some(index) = self.entries.iter().position(|e| e.handle == handle) {
            self.entries.swap_remove(index);
            true
        } else if let Some(children) = self.children.as_mut() {
            // A grown root keeps its old self as one child, so entries in that
            // child's loose margin can sit off their best-fit octant.
            let best_fit = octant_index(&self.center, &bounds.center());
            let child_bounds = &self.child_bounds;
            std::iter::once(best_fit)
                .chain((0..8).filter(|&octant| octant != best_fit))
                .filter(|&octant| child_bounds[octant].contains_aabb(bounds))
                .any(|octant| children[octant].sub_remove(handle, bounds))
        } else {
            false
        };

        if removed && self.should_merge() {
            self.merge();
        }

        removed
    }

    /// Check if any entry overlaps `query`
    pub fn is_colliding(&self, query: &AABB) -> bool {
        if !self.bounds.intersects(query) {
            return false;
        }

        if self.entries.iter().any(|e| !e.handle.is_null() && e.bounds.intersects(query)) {
            return true;
        }

        self.children
            .as_ref()
            .is_some_and(|children| children.iter().any(|child| child.is_colliding(query)))
    }

    /// Collect every entry overlapping `query`
    pub fn get_colliding(&self, query: &AABB, results: &mut Vec<H>) {
        if !self.bounds.intersects(query) {
            return;
        }

        results.extend(
            self.entries
                .iter()
                .filter(|e| !e.handle.is_null() && e.bounds.intersects(query))
                .map(|e| e.handle),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.get_colliding(query, results);
            }
        }
    }

    /// Check if the ray hits any entry within `max_distance`
    pub fn is_colliding_ray(&self, ray: &Ray, max_distance: f32) -> bool {
        if !self.bounds.intersects_ray(ray, max_distance) {
            return false;
        }

        if self
            .entries
            .iter()
            .any(|e| !e.handle.is_null() && e.bounds.intersects_ray(ray, max_distance))
        {
            return true;
        }

        self.children.as_ref().is_some_and(|children| {
            children.iter().any(|child| child.is_colliding_ray(ray, max_distance))
        })
    }

    /// Collect every entry the ray hits within `max_distance`
    pub fn get_colliding_ray(&self, ray: &Ray, max_distance: f32, results: &mut Vec<H>) {
        if !self.bounds.intersects_ray(ray, max_distance) {
            return;
        }

        for entry in &self.entries {
            if !entry.handle.is_null() && entry.bounds.intersects_ray(ray, max_distance) {
                results.push(entry.handle);
            }
        }

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.get_colliding_ray(ray, max_distance, results);
            }
        }
    }

    /// Collect every entry a sphere of `radius` swept along the ray touches
    pub fn get_colliding_ray_with_radius(
        &self,
        ray: &Ray,
        radius: f32,
        max_distance: f32,
        results: &mut Vec<H>,
    ) {
        if !self.bounds.intersects_ray_with_radius(ray, radius, max_distance) {
            return;
        }

        for entry in &self.entries {
            if !entry.handle.is_null()
                && entry.bounds.intersects_ray_with_radius(ray, radius, max_distance)
            {
                results.push(entry.handle);
            }
        }

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.get_colliding_ray_with_radius(ray, radius, max_distance, results);
            }
        }
    }

    /// Collect every entry not excluded by any of `planes`
    pub fn get_within_frustum(&self, planes: &[Plane], results: &mut Vec<H>) {
        if !planes_intersect_aabb(planes, &self.bounds) {
            return;
        }

        for entry in &self.entries {
            if !entry.handle.is_null() && planes_intersect_aabb(planes, &entry.bounds) {
                results.push(entry.handle);
            }
        }

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.get_within_frustum(planes, results);
            }
        }
    }

    /// Collect the loose bounds of this node and every descendant
    pub fn collect_bounds(&self, out: &mut Vec<AABB>) {
        out.push(self.bounds);

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.collect_bounds(out);
            }
        }
    }

    /// Collapse this node toward a single child if all content fits there.
    ///
    /// Returns `true` when the node changed. A childless node just takes on
    /// the child octant's geometry; a node with children is replaced by the
    /// one populated child, which also receives this node's own entries.
    pub fn shrink_if_possible(&mut self, min_length: f32) -> bool {
        if self.base_length < 2.0 * min_length {
            return false;
        }
        if self.entries.is_empty() && self.children.is_none() {
            return false;
        }

        let mut best_fit: Option<usize> = None;

        for entry in &self.entries {
            let octant = self.best_fit_child(&entry.bounds.center());
            if best_fit.is_some_and(|fit| fit != octant) {
                return false; // Entries spread over several octants
            }
            if !self.child_bounds[octant].contains_aabb(&entry.bounds) {
                return false;
            }
            best_fit = Some(octant);
        }

        if let Some(children) = &self.children {
            let mut child_had_content = false;
            for (octant, child) in children.iter().enumerate() {
                if !child.has_any_objects() {
                    continue;
                }
                if child_had_content || best_fit.is_some_and(|fit| fit != octant) {
                    return false;
                }
                child_had_content = true;
                best_fit = Some(octant);
            }
        }

        let Some(best_fit) = best_fit else {
            return false;
        };

        match self.children.take() {
            None => {
                let center = self.child_bounds[best_fit].center();
                self.set_values(self.base_length / 2.0, self.min_size, self.looseness, center);
            }
            Some(children) => {
                let mut promoted = Vec::from(children as Box<[OctreeNode<H>]>).swap_remove(best_fit);
                for entry in std::mem::take(&mut self.entries) {
                    promoted.sub_add(entry);
                }
                *self = promoted;
            }
        }

        true
    }
}
