//! Position / rotation / scale transform.
//!
//! [`Transform`] stores its rotation as Euler angles in **degrees**, which is
//! the form persisted to documents and sent over the wire. The equivalent
//! quaternion is available through [`Transform::orientation`].

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A transform with position, Euler rotation (degrees) and non-uniform scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Translation.
    pub pos: Vec3,
    /// Rotation as Euler angles in degrees, applied Z, then Y, then X.
    pub rot: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        pos: Vec3::ZERO,
        rot: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub const fn new(pos: Vec3, rot: Vec3, scale: Vec3) -> Self {
        Self { pos, rot, scale }
    }

    /// Create a transform with the given position and default rotation/scale.
    #[must_use]
    pub fn from_position(pos: Vec3) -> Self {
        Self {
            pos,
            ..Self::IDENTITY
        }
    }

    /// The rotation as a unit quaternion.
    #[must_use]
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::ZYX,
            self.rot.z.to_radians(),
            self.rot.y.to_radians(),
            self.rot.x.to_radians(),
        )
    }

    /// Replace the rotation with the Euler decomposition of `q`.
    pub fn set_orientation(&mut self, q: Quat) {
        let (z, y, x) = q.normalize().to_euler(EulerRot::ZYX);
        self.rot = Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees());
    }

    /// The nine scalar fields in wire order: `pos.xyz, rot.xyz, scale.xyz`.
    #[must_use]
    pub fn to_array(&self) -> [f32; 9] {
        [
            self.pos.x,
            self.pos.y,
            self.pos.z,
            self.rot.x,
            self.rot.y,
            self.rot.z,
            self.scale.x,
            self.scale.y,
            self.scale.z,
        ]
    }

    #[must_use]
    pub fn from_array(f: [f32; 9]) -> Self {
        Self {
            pos: Vec3::new(f[0], f[1], f[2]),
            rot: Vec3::new(f[3], f[4], f[5]),
            scale: Vec3::new(f[6], f[7], f[8]),
        }
    }

    /// Component-wise interpolation: linear for position and scale, spherical
    /// for the rotation.
    #[must_use]
    pub fn interpolate(&self, end: &Self, t: f32) -> Self {
        let mut out = Self {
            pos: self.pos.lerp(end.pos, t),
            rot: self.rot,
            scale: self.scale.lerp(end.scale, t),
        };
        out.set_orientation(self.orientation().slerp(end.orientation(), t));
        out
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let t = Transform::IDENTITY;
        assert_eq!(t.pos, Vec3::ZERO);
        assert_eq!(t.rot, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.orientation(), Quat::IDENTITY);
    }

    #[test]
    fn test_orientation_roundtrip() {
        let mut t = Transform::IDENTITY;
        let q = Quat::from_rotation_y(30f32.to_radians());
        t.set_orientation(q);
        assert!((t.rot.y - 30.0).abs() < 1e-3);
        assert!(t.orientation().abs_diff_eq(q, 1e-5));
    }

    #[test]
    fn test_array_order() {
        let t = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
        );
        assert_eq!(t.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(Transform::from_array(t.to_array()), t);
    }

    #[test]
    fn test_interpolate_halfway_rotation() {
        let a = Transform::IDENTITY;
        let mut b = Transform::from_position(Vec3::new(10.0, 0.0, 0.0));
        b.rot = Vec3::new(0.0, 0.0, 90.0);
        let mid = a.interpolate(&b, 0.5);
        assert!(mid.pos.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));
        assert!((mid.rot.z - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let bytes = rmp_serde::to_vec(&t).unwrap();
        let restored: Transform = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(t, restored);
    }
}
