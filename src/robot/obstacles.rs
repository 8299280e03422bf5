//! Workspace obstacle sensing port.

use crate::core::types::Point2D;

/// A timestamped set of obstacle points in the robot frame at sense time.
#[derive(Debug, Clone, Default)]
pub struct ObstacleSnapshot {
    /// Obstacle points, robot frame, meters.
    pub points: Vec<Point2D>,
    /// Robot-clock timestamp of the observation (seconds).
    pub timestamp: f64,
}

/// Per-tick obstacle sensing hook.
///
/// Implementations typically read the latest laser/sonar scan, filter it
/// and return the points; `now` is provided so sources without their own
/// clock can stamp the snapshot.
pub trait ObstacleSource {
    /// Produce the current obstacle snapshot. An `Err` triggers an
    /// emergency stop and aborts the navigation with an error state.
    fn sense(&mut self, now: f64) -> Result<ObstacleSnapshot, String>;
}
