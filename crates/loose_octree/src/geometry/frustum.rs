//! Frustum planes and the plane/AABB test used for visibility culling

use crate::foundation::math::{Mat4, Vec3, Vec4};
use super::AABB;

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (unit length, pointing toward the inside)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    ///
    /// Both are scaled by the normal's length so the plane itself is unchanged.
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.magnitude();
        if length > 0.0 {
            Self { normal: normal / length, distance: distance / length }
        } else {
            Self { normal, distance }
        }
    }

    /// Create a plane passing through `point` facing along `normal`
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        let distance = -normal.dot(&point);
        Self { normal, distance }
    }

    /// Build a plane from packed (A, B, C, D) coefficients
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        Self::new(coefficients.xyz(), coefficients.w)
    }

    /// Calculate signed distance from plane to point (positive = inside)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Standard plane/AABB test.
///
/// For every plane, the AABB corner furthest along the plane normal (the
/// positive vertex) is checked. If it lies behind any plane the box is
/// entirely outside. Conservative: may accept boxes near frustum corners.
pub fn planes_intersect_aabb(planes: &[Plane], aabb: &AABB) -> bool {
    planes.iter().all(|plane| {
        let mut p = aabb.min;
        if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
        if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
        if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

        plane.distance_to_point(p) >= 0.0
    })
}

/// Frustum for visibility culling
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction for OpenGL-style clip space
    /// (z in [-w, w]), as produced by `nalgebra::Perspective3`.
    pub fn from_matrix(vp_matrix: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { vp_matrix.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0), // left
                Plane::from_coefficients(r3 - r0), // right
                Plane::from_coefficients(r3 + r1), // bottom
                Plane::from_coefficients(r3 - r1), // top
                Plane::from_coefficients(r3 + r2), // near
                Plane::from_coefficients(r3 - r2), // far
            ],
        }
    }

    /// The frustum planes as a slice
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        planes_intersect_aabb(&self.planes, aabb)
    }
}
