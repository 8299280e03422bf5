//! Per-tick candidate bookkeeping for the reactive pipeline.

use crate::core::types::{Point2D, RobotPoseVel, VelCmd};
use crate::ptg::ClearanceDiagram;
use std::collections::HashMap;

/// Speed value that marks a candidate as inviable; the optimizer must
/// discard any candidate with negative speed.
pub const INVALID_SPEED: f64 = -0.01;

/// A candidate motion: one trajectory family, one direction, one speed
/// scale, plus the named scalar factors the motion optimizer ranks.
#[derive(Debug, Clone, Default)]
pub struct CandidateMovement {
    /// Index of the PTG this candidate belongs to. `None` when no PTG was
    /// applicable (e.g. the NOP slot when continuation is not possible).
    pub ptg_index: Option<usize>,
    /// Chosen direction angle in TP-space (radians).
    pub direction: f32,
    /// Speed scale in [0, 1]; negative marks the candidate inviable.
    pub speed: f64,
    /// Named evaluation factors consumed by the optimizer.
    pub props: HashMap<String, f64>,
}

impl CandidateMovement {
    /// Mark this candidate inviable so the optimizer discards it.
    pub fn invalidate(&mut self) {
        self.speed = INVALID_SPEED;
    }

    /// Whether the optimizer may select this candidate.
    pub fn is_viable(&self) -> bool {
        self.speed >= 0.0
    }

    /// Read a factor, 0.0 when absent.
    pub fn prop(&self, key: &str) -> f64 {
        self.props.get(key).copied().unwrap_or(0.0)
    }
}

/// Per-PTG scratch data rebuilt on every tick.
#[derive(Debug, Clone, Default)]
pub struct PtgTickInfo {
    /// Whether the target projects into this PTG's domain this tick.
    pub valid: bool,
    /// Discretised direction index of the target.
    pub target_k: usize,
    /// Direction angle of `target_k` (radians).
    pub target_alpha: f32,
    /// Normalized trajectory distance of the target, [0, 1].
    pub target_d_norm: f32,
    /// Target in TP-space Cartesian coordinates.
    pub tp_target: Point2D,
    /// Normalized collision-free distance per direction, [0, 1].
    pub tp_obstacles: Vec<f32>,
    /// Clearance diagram (empty when clearance evaluation is disabled).
    pub clearance: ClearanceDiagram,
}

/// Record of the last velocity command issued to the robot.
///
/// The NOP evaluation replays this to decide whether the previous command
/// may keep running for another tick.
#[derive(Debug, Clone)]
pub struct SentVelCmd {
    /// PTG the command was generated from.
    pub ptg_index: usize,
    /// Discretised direction that was commanded.
    pub alpha_index: usize,
    /// Discretised direction of the target at issue time.
    pub tp_target_k: usize,
    /// Normalized collision-free distance at the commanded direction when
    /// the command was issued.
    pub colfree_dist_move_k: f32,
    /// Robot-clock time the command was sent (seconds).
    pub time_sent: f64,
    /// Cumulative speed scale applied to the command.
    pub speed_scale: f64,
    /// Robot dynamic state snapshot at issue time.
    pub pose_vel: RobotPoseVel,
    /// The command itself as accepted by the robot.
    pub cmd: VelCmd,
}

impl SentVelCmd {
    /// Forget the previous command; NOP continuation becomes impossible
    /// until a new command is sent.
    pub fn reset(&mut self) {
        *self = SentVelCmd::default();
    }

    /// Whether a previous command exists.
    pub fn is_valid(&self) -> bool {
        self.pose_vel.is_valid() && self.time_sent.is_finite()
    }
}

impl Default for SentVelCmd {
    fn default() -> Self {
        Self {
            ptg_index: 0,
            alpha_index: 0,
            tp_target_k: 0,
            colfree_dist_move_k: 0.0,
            time_sent: f64::NEG_INFINITY,
            speed_scale: 1.0,
            pose_vel: RobotPoseVel::default(),
            cmd: VelCmd::STOP,
        }
    }
}
