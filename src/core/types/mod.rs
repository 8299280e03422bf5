//! Core data types for reactive navigation.
//!
//! - [`Point2D`], [`Pose2D`]: planar geometry in meters/radians
//! - [`Twist2D`]: planar velocity twist
//! - [`VelCmd`], [`SpeedLimits`]: kinematic velocity commands
//! - [`RobotPoseVel`]: last observed robot dynamic state
//! - [`PoseHistory`]: interpolatable timeline of recent poses

mod pose;
mod pose_history;
mod robot_state;
mod twist;
mod vel_cmd;

pub use pose::{Point2D, Pose2D};
pub use pose_history::{PoseHistory, DEFAULT_MAX_AGE};
pub use robot_state::{RobotPoseVel, INVALID_TIMESTAMP};
pub use twist::Twist2D;
pub use vel_cmd::{SpeedLimits, VelCmd};
