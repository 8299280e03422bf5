//! Pose and point types for planar navigation.

use serde::{Deserialize, Serialize};

/// A 2D point in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters
    pub y: f32,
}

impl Point2D {
    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Distance to the origin.
    #[inline]
    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Robot pose in 2D space.
///
/// Position (x, y) in meters and heading (phi) in radians, normalized to
/// [-π, π].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters
    pub x: f32,
    /// Y position in meters
    pub y: f32,
    /// Heading in radians, normalized to [-π, π]
    pub phi: f32,
}

impl Pose2D {
    /// Create a new pose with phi normalized to [-π, π].
    #[inline]
    pub fn new(x: f32, y: f32, phi: f32) -> Self {
        Self {
            x,
            y,
            phi: crate::core::math::normalize_angle(phi),
        }
    }

    /// Identity pose at the origin with zero heading.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            phi: 0.0,
        }
    }

    /// Position component of the pose.
    #[inline]
    pub fn point(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Compose two poses: self ⊕ other.
    ///
    /// Applies `other` relative to the `self` frame.
    #[inline]
    pub fn compose(&self, other: &Pose2D) -> Pose2D {
        let (sin_p, cos_p) = self.phi.sin_cos();
        Pose2D::new(
            self.x + other.x * cos_p - other.y * sin_p,
            self.y + other.x * sin_p + other.y * cos_p,
            self.phi + other.phi,
        )
    }

    /// Inverse of this pose: the transform that undoes it.
    #[inline]
    pub fn inverse(&self) -> Pose2D {
        let (sin_p, cos_p) = self.phi.sin_cos();
        Pose2D::new(
            -self.x * cos_p - self.y * sin_p,
            self.x * sin_p - self.y * cos_p,
            -self.phi,
        )
    }

    /// This pose expressed in the frame of `base`: base⁻¹ ⊕ self.
    ///
    /// The planar analogue of "pose subtraction".
    #[inline]
    pub fn relative_to(&self, base: &Pose2D) -> Pose2D {
        base.inverse().compose(self)
    }

    /// Transform a point from the local frame of this pose to the global frame.
    #[inline]
    pub fn transform_point(&self, point: &Point2D) -> Point2D {
        let (sin_p, cos_p) = self.phi.sin_cos();
        Point2D::new(
            self.x + point.x * cos_p - point.y * sin_p,
            self.y + point.x * sin_p + point.y * cos_p,
        )
    }

    /// Transform a point from the global frame into the local frame of this pose.
    #[inline]
    pub fn inverse_transform_point(&self, point: &Point2D) -> Point2D {
        let (sin_p, cos_p) = self.phi.sin_cos();
        let dx = point.x - self.x;
        let dy = point.y - self.y;
        Point2D::new(dx * cos_p + dy * sin_p, -dx * sin_p + dy * cos_p)
    }

    /// Planar distance to a point, ignoring heading.
    #[inline]
    pub fn distance_2d(&self, x: f32, y: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}
