//! Axis-Aligned Bounding Box and its intersection tests

use crate::foundation::math::{utils::splat, Vec3};
use super::Ray;

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents (half-size)
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Create an AABB centered at a point with given full edge lengths
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        Self::from_center_extents(center, size * 0.5)
    }

    /// Create a cube centered at a point with the given edge length
    pub fn cube(center: Vec3, edge: f32) -> Self {
        Self::from_center_extents(center, splat(edge * 0.5))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the full edge lengths of the AABB
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if `other` lies entirely inside this AABB (touching faces count)
    pub fn contains_aabb(&self, other: &AABB) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Test ray intersection with this AABB using slab method
    /// Returns the distance to the entry point if the ray intersects, None otherwise
    /// Based on "An Efficient and Robust Ray–Box Intersection Algorithm"
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];

            if dir == 0.0 {
                // Parallel to this slab; touching a face still counts
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }

            let inv_dir = 1.0 / dir;
            let t1 = (self.min[axis] - origin) * inv_dir;
            let t2 = (self.max[axis] - origin) * inv_dir;
            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        // Ray intersects if tmax >= tmin and tmax >= 0
        if tmax >= tmin && tmax >= 0.0 {
            // Entry point distance, or 0 if we're inside the box
            Some(tmin.max(0.0))
        } else {
            None
        }
    }

    /// Check if the ray enters this AABB within `max_distance` of its origin
    pub fn intersects_ray(&self, ray: &Ray, max_distance: f32) -> bool {
        matches!(self.intersect_ray(ray), Some(distance) if distance <= max_distance)
    }

    /// Approximate capsule test: does a sphere of `radius` swept along the ray
    /// touch this AABB within `max_distance`?
    ///
    /// Each face plane is pushed outward by `radius` and the ray is clipped
    /// against it; the hit counts when it lands inside the face rectangle
    /// widened by `radius` on both remaining axes.
    pub fn intersects_ray_with_radius(&self, ray: &Ray, radius: f32, max_distance: f32) -> bool {
        let radius = radius.max(0.0);
        let widened = AABB::new(self.min - splat(radius), self.max + splat(radius));

        if widened.contains_point(ray.origin) {
            return true;
        }

        for axis in 0..3 {
            let dir = ray.direction[axis];
            if dir == 0.0 {
                continue; // Parallel to both faces on this axis
            }

            let (a, b) = ((axis + 1) % 3, (axis + 2) % 3);
            for face in [widened.min[axis], widened.max[axis]] {
                let t = (face - ray.origin[axis]) / dir;
                if !(0.0..=max_distance).contains(&t) {
                    continue;
                }

                let hit = ray.point_at(t);
                if hit[a] >= widened.min[a] && hit[a] <= widened.max[a] &&
                   hit[b] >= widened.min[b] && hit[b] <= widened.max[b]
                {
                    return true;
                }
            }
        }

        false
    }
}
