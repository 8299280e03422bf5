//! Parameterized trajectory generator (PTG) contract.
//!
//! A PTG is a precomputed family of robot trajectories indexed by a discrete
//! direction ("alpha index"). It maps workspace points into its
//! trajectory-parameter space and back, and turns a chosen direction into a
//! kinematic velocity command. Concrete geometry families (circular arcs,
//! alpha-a trajectories, ...) live outside this crate; the navigator only
//! consumes this trait.

mod clearance;

pub use clearance::ClearanceDiagram;

use crate::core::types::{Pose2D, Twist2D, VelCmd};

/// Contract between the reactive navigator and a trajectory family.
///
/// Distances in TP-space are meters until the pipeline normalizes them by
/// [`ref_distance`](TrajectoryGenerator::ref_distance); the navigator hands
/// normalized values back to `step_for_dist` after multiplying by the
/// reference distance again.
pub trait TrajectoryGenerator {
    /// Short human-readable description for logs.
    fn description(&self) -> String;

    /// Number of discretised trajectory directions.
    fn path_count(&self) -> usize;

    /// Discretise a direction angle (radians) into an alpha index.
    fn alpha_to_index(&self, alpha: f32) -> usize;

    /// Direction angle (radians) of alpha index `k`.
    fn index_to_alpha(&self, k: usize) -> f32;

    /// Maximum lookahead distance of the family (meters).
    fn ref_distance(&self) -> f32;

    /// Compute or load the collision grid. Called once per initialization.
    fn init_collision_grid(&mut self);

    /// Inverse map: workspace point (robot frame) to TP-space.
    ///
    /// Returns `(k, d_norm)` with `d_norm` in [0, 1] when the point lies in
    /// the PTG domain, `None` otherwise.
    fn inverse_map(&self, x: f32, y: f32) -> Option<(usize, f32)>;

    /// Robot-relative pose after `step` simulation steps along direction `k`.
    fn path_pose(&self, k: usize, step: u32) -> Pose2D;

    /// Arc length (meters) travelled after `step` steps along direction `k`.
    fn path_dist(&self, k: usize, step: u32) -> f32;

    /// Step index at which direction `k` reaches arc length `dist` meters.
    ///
    /// `None` when `dist` lies beyond the trajectory.
    fn step_for_dist(&self, k: usize, dist: f32) -> Option<u32>;

    /// Duration of one simulation step (seconds).
    fn step_duration(&self) -> f64;

    /// Feed the current body-frame robot velocity into the family, for
    /// families whose trajectories depend on the initial dynamic state.
    fn update_current_robot_vel(&mut self, vel_local: &Twist2D);

    /// Kinematic command that drives the robot along direction `k` at full
    /// normalized speed.
    fn direction_to_motion_command(&self, k: usize) -> VelCmd;

    /// Shrink a TP-obstacle entry for direction `k` given an obstacle point
    /// at `(ox, oy)` in the PTG origin frame. Distances in `tp_obstacles`
    /// are meters (not yet normalized).
    fn update_tp_obstacle(&self, ox: f32, oy: f32, tp_obstacles: &mut [f32]);

    /// Update the clearance diagram for an obstacle point at `(ox, oy)` in
    /// the PTG origin frame. Default: no clearance information.
    fn update_clearance(&self, _ox: f32, _oy: f32, _clearance: &mut ClearanceDiagram) {}

    /// Whether this family supports "keep the previous command" (NOP).
    fn supports_nop_cmd(&self) -> bool {
        false
    }

    /// Maximum time (seconds) the previous command for direction `k` may
    /// keep running before it must be reissued.
    fn max_nop_time(&self, _k: usize) -> f64 {
        0.0
    }

    /// Whether the WS↔TPS mapping is unique at `(k, step)`.
    fn is_bijective_at(&self, _k: usize, _step: u32) -> bool {
        true
    }

    /// Relative weight of this family in the candidate evaluation.
    fn score_priority(&self) -> f64 {
        1.0
    }

    /// Relative priority of the path `(k, d_norm)` within this family.
    fn path_relative_priority(&self, _k: usize, _d_norm: f32) -> f64 {
        1.0
    }

    /// Fresh TP-obstacle array: one entry per direction, each starting at
    /// the reference distance (fully free).
    fn init_tp_obstacles(&self) -> Vec<f32> {
        vec![self.ref_distance(); self.path_count()]
    }

    /// Fresh clearance diagram covering all directions of this family.
    fn init_clearance(&self) -> ClearanceDiagram {
        ClearanceDiagram::new(self.path_count())
    }
}
