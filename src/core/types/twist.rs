//! Planar velocity twist.

use serde::{Deserialize, Serialize};

/// Planar velocity: (vx, vy) in m/s and omega in rad/s.
///
/// The same type is used for global-frame and body-frame twists; the two
/// are related by a rotation of the linear part by the robot heading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist2D {
    /// Linear velocity along X (m/s)
    pub vx: f32,
    /// Linear velocity along Y (m/s)
    pub vy: f32,
    /// Angular velocity (rad/s), CCW positive
    pub omega: f32,
}

impl Twist2D {
    /// Create a new twist.
    #[inline]
    pub fn new(vx: f32, vy: f32, omega: f32) -> Self {
        Self { vx, vy, omega }
    }

    /// Rotate the linear part by `angle` radians; omega is unchanged.
    ///
    /// Rotating a global twist by `-phi` yields the body-frame twist.
    #[inline]
    pub fn rotated(&self, angle: f32) -> Twist2D {
        let (sin_a, cos_a) = angle.sin_cos();
        Twist2D {
            vx: self.vx * cos_a - self.vy * sin_a,
            vy: self.vx * sin_a + self.vy * cos_a,
            omega: self.omega,
        }
    }

    /// Magnitude of the linear velocity (m/s).
    #[inline]
    pub fn linear_speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}
