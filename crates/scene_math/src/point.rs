//! Two-dimensional integer point.

use serde::{Deserialize, Serialize};

/// A 2D point with signed 32-bit coordinates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct IntPoint {
    pub x: i32,
    pub y: i32,
}

impl IntPoint {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Interpolates each coordinate in floating point and rounds to the
    /// nearest integer.
    #[must_use]
    pub fn lerp(self, end: Self, t: f32) -> Self {
        Self::new(
            crate::lerp(self.x as f32, end.x as f32, t).round() as i32,
            crate::lerp(self.y as f32, end.y as f32, t).round() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_rounds() {
        let p = IntPoint::new(0, 0).lerp(IntPoint::new(3, -3), 0.5);
        assert_eq!(p, IntPoint::new(2, -2));
    }
}
