//! Robot-side ports: the actuator/sensor interface and obstacle sensing.
//!
//! The navigator never talks to hardware directly; hosts implement these
//! traits against their robot base or simulator. Callbacks must return
//! quickly (well under one tick period) and must not re-enter the
//! navigator.

mod obstacles;

pub use obstacles::{ObstacleSnapshot, ObstacleSource};

use crate::core::types::{Pose2D, Twist2D, VelCmd};

/// Interface between the navigator and the robot platform.
///
/// Command methods return `false` on failure; the navigator reacts with an
/// emergency stop and an error state. Event methods are fire-and-forget
/// notifications; the default implementations do nothing.
pub trait RobotInterface {
    /// Current robot pose, world-frame velocity twist and the sensor
    /// timestamp of that observation (robot clock, seconds).
    fn current_pose_and_speeds(&mut self) -> Result<(Pose2D, Twist2D, f64), String>;

    /// Send a new velocity command. Returns false on failure.
    fn change_speeds(&mut self, cmd: &VelCmd) -> bool;

    /// Keep executing the previously sent command (NOP).
    fn change_speeds_nop(&mut self) -> bool;

    /// Stop the robot. `is_emergency` selects the hard-stop path.
    fn stop(&mut self, is_emergency: bool) -> bool;

    /// The command this platform uses as its emergency stop.
    fn emergency_stop_cmd(&self) -> VelCmd {
        VelCmd::STOP
    }

    /// Arm the robot-side watchdog: the robot stops autonomously if no
    /// command arrives within `timeout_ms`.
    fn start_watchdog(&mut self, timeout_ms: u32);

    /// Disarm the robot-side watchdog.
    fn stop_watchdog(&mut self);

    /// Monotonic navigation clock in seconds. Wall time on real robots,
    /// simulation time in simulators.
    fn navigation_time(&self) -> f64;

    /// A navigation has started.
    fn on_nav_start(&mut self) {}

    /// The target has been (or is about to be) reached.
    fn on_nav_end(&mut self) {}

    /// Navigation ended because of an error.
    fn on_nav_end_due_to_error(&mut self) {}

    /// No progress toward the target for too long.
    fn on_way_seems_blocked(&mut self) {}

    /// Waypoint `index` of the active sequence was reached or skipped.
    fn on_waypoint_reached(&mut self, _index: usize) {}

    /// Waypoint `index` became the active navigation target.
    fn on_new_waypoint_target(&mut self, _index: usize) {}
}
