//! Last observed robot dynamic state.

use crate::core::types::{Pose2D, Twist2D};
use serde::{Deserialize, Serialize};

/// Sentinel for "no timestamp yet".
pub const INVALID_TIMESTAMP: f64 = f64::NEG_INFINITY;

/// Snapshot of the robot pose and velocities at a sensor timestamp.
///
/// Invariant: `vel_local` equals `vel_global` with its linear part rotated
/// by `-pose.phi`. The navigator maintains this on every pose refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RobotPoseVel {
    /// Robot pose in the odometry/world frame.
    pub pose: Pose2D,
    /// Velocity twist in the world frame.
    pub vel_global: Twist2D,
    /// Velocity twist in the robot body frame.
    pub vel_local: Twist2D,
    /// Sensor timestamp (robot monotonic clock, seconds).
    pub timestamp: f64,
}

impl RobotPoseVel {
    /// Build from a sensed pose + global twist, deriving the body twist.
    pub fn from_sensed(pose: Pose2D, vel_global: Twist2D, timestamp: f64) -> Self {
        Self {
            pose,
            vel_global,
            vel_local: vel_global.rotated(-pose.phi),
            timestamp,
        }
    }

    /// Whether this snapshot holds real sensor data.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.timestamp != INVALID_TIMESTAMP
    }
}

impl Default for RobotPoseVel {
    fn default() -> Self {
        Self {
            pose: Pose2D::identity(),
            vel_global: Twist2D::default(),
            vel_local: Twist2D::default(),
            timestamp: INVALID_TIMESTAMP,
        }
    }
}
