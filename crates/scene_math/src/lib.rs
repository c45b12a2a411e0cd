//! # scene_math
//!
//! Math value types stored in scene attributes. Re-exports [`glam`] for the
//! vector and quaternion kinds and defines the composite types the attribute
//! system needs on top of it.

pub mod color;
pub mod point;
pub mod transform;

// Re-export glam types for convenience.
pub use glam::{EulerRot, Quat, Vec2, Vec3, Vec4};

pub use color::Color;
pub use point::IntPoint;
pub use transform::Transform;

/// Linear interpolation between two scalars.
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
        assert_eq!(lerp(2.0, 6.0, 0.5), 4.0);
    }
}
