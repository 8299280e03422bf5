//! Per-tick decision snapshot for observers.

use crate::core::types::{Pose2D, Twist2D, VelCmd};
use std::collections::HashMap;

/// Snapshot of one reactive decision, published after every tick.
///
/// Observers (UIs, telemetry) read the latest record through the shared
/// handle returned by the navigator; the navigator overwrites it each tick
/// behind its own lock so readers never block the control loop.
#[derive(Debug, Clone, Default)]
pub struct NavLogRecord {
    /// Robot odometry pose at the tick.
    pub robot_pose: Pose2D,
    /// Body-frame robot velocity at the tick.
    pub vel_local: Twist2D,
    /// Target relative to the (extrapolated) robot pose.
    pub rel_target: Pose2D,
    /// Index of the selected candidate; `None` when every candidate was
    /// discarded and the robot was stopped.
    pub selected: Option<usize>,
    /// Whether the selected candidate was the NOP continuation.
    pub selected_is_nop: bool,
    /// The command issued this tick; `None` for NOP.
    pub cmd: Option<VelCmd>,
    /// Final optimizer evaluation per candidate.
    pub evaluations: Vec<f64>,
    /// Named scalar diagnostics (latency estimates, period, offsets).
    pub values: HashMap<String, f64>,
    /// Robot-clock time of the tick start.
    pub timestamp: f64,
}
