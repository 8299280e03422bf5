//! Holonomic navigation method contract.
//!
//! A holonomic method works entirely in normalized TP-space: given the
//! per-direction collision-free distances and the target, it picks a
//! direction and a speed in [0, 1]. Concrete methods (gap search, force
//! fields, full grid evaluation) are plug-ins registered by name.

use crate::core::types::Point2D;
use crate::error::Result;
use crate::ptg::{ClearanceDiagram, TrajectoryGenerator};

/// Input to one holonomic navigation query. All distances normalized.
pub struct HolonomicInput<'a> {
    /// The trajectory family this query runs against, for direction
    /// discretisation and path queries.
    pub ptg: &'a dyn TrajectoryGenerator,
    /// Collision-free distance per discretised direction, in [0, 1].
    pub obstacles: &'a [f32],
    /// Target in TP-space Cartesian coordinates, |target| in [0, 1].
    pub target: Point2D,
    /// Clearance information, when clearance evaluation is enabled.
    pub clearance: Option<&'a ClearanceDiagram>,
    /// Maximum obstacle distance (normalized; always 1.0 here).
    pub max_obstacle_dist: f32,
    /// Maximum speed (normalized; always 1.0 here).
    pub max_robot_speed: f32,
}

/// Output of one holonomic navigation query.
#[derive(Debug, Clone, Copy, Default)]
pub struct HolonomicOutput {
    /// Desired motion direction (radians in TP-space).
    pub direction: f32,
    /// Desired speed in [0, 1].
    pub speed: f32,
}

/// Strategy that picks a direction and speed in TP-space.
///
/// One instance exists per PTG so methods may keep per-family state.
pub trait HolonomicMethod {
    /// Load method parameters from the configuration bag.
    fn initialize(&mut self, params: &toml::value::Table) -> Result<()>;

    /// Enable or disable slowing down when approaching the target.
    ///
    /// Disabled while heading to intermediary waypoints so the robot keeps
    /// its cruise speed through them.
    fn enable_approach_target_slowdown(&mut self, enable: bool);

    /// Pick a direction and speed for the current TP-space situation.
    fn navigate(&mut self, input: &HolonomicInput<'_>) -> HolonomicOutput;
}
