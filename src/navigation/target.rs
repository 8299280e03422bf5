//! Single-target navigation requests.

use crate::core::types::Pose2D;
use serde::{Deserialize, Serialize};

/// A single-target navigation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavTarget {
    /// Desired target pose. Heading may be ignored by implementations that
    /// only care about position.
    pub target: Pose2D,

    /// Distance (meters) at which the target counts as reached.
    pub allowed_distance: f32,

    /// Whether `target` is relative to the robot pose at acceptance time.
    /// Resolved to absolute coordinates when the request is accepted.
    pub relative: bool,

    /// Whether this target is an intermediary waypoint of a sequence. When
    /// true the robot does not slow down on approach and no navigation-end
    /// event is emitted for this target.
    pub intermediary_waypoint: bool,

    /// When non-empty, only the PTGs at these indices are considered while
    /// driving to this target.
    pub restrict_ptg_indices: Vec<usize>,
}

impl NavTarget {
    /// Request driving to an absolute pose with default tolerances.
    pub fn to_pose(target: Pose2D) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    /// Request driving to an absolute point, heading free.
    pub fn to_point(x: f32, y: f32) -> Self {
        Self::to_pose(Pose2D::new(x, y, 0.0))
    }
}

impl Default for NavTarget {
    fn default() -> Self {
        Self {
            target: Pose2D::identity(),
            allowed_distance: 0.5,
            relative: false,
            intermediary_waypoint: false,
            restrict_ptg_indices: Vec::new(),
        }
    }
}
