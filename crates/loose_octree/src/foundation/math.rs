//! Math utilities and types
//!
//! Provides the vector and matrix aliases used by the spatial index.

pub use nalgebra::{Matrix4, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math utility functions
pub mod utils {
    use super::Vec3;

    /// `1.0` when `value` is non-negative, `-1.0` otherwise
    pub fn sign_or_positive(value: f32) -> f32 {
        if value >= 0.0 { 1.0 } else { -1.0 }
    }

    /// Build a vector with the same scalar on every axis
    pub fn splat(value: f32) -> Vec3 {
        Vec3::new(value, value, value)
    }
}
