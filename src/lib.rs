//! DishaNav - Reactive TP-space local navigator for mobile robots.
//!
//! Given a stream of robot odometry, obstacle observations and a target,
//! the navigator decides at a fixed rate what velocity command to issue so
//! the robot progresses toward the target while avoiding obstacles. It is
//! a control loop, not a path planner: there is no global map and no graph
//! search.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  navigation/                        │  ← Orchestration
//! │   (state machine, waypoint sequencer, shared API)   │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   reactive/                         │  ← Decision pipeline
//! │   (delay model, candidates, scoring, issue stage)   │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │            ptg/  strategies/  robot/                │  ← Ports
//! │   (trajectory families, plug-in strategies, robot)  │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │                 (types, math)                       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! Implement [`RobotInterface`] and [`ObstacleSource`] against your
//! platform, register your strategies, then drive the loop:
//!
//! ```ignore
//! let mut registry = StrategyRegistry::new();
//! registry.register_holonomic("full_eval", || Box::new(MyHolonomic::new()));
//! registry.register_optimizer("weighted", || Box::new(MyOptimizer::new()));
//!
//! let config = NavigatorConfig::load(Path::new("nav.toml"))?;
//! let mut nav = ReactiveNavigator::new(robot, obstacles, ptgs, config, &registry)?;
//! nav.initialize();
//! nav.navigate(&NavTarget::to_point(5.0, 0.0))?;
//! loop {
//!     nav.step(); // at 5-20 Hz
//! }
//! ```
//!
//! The navigator spawns no threads; it is single-owner `&mut self`. Use
//! [`SharedNavigator`] when several threads need access.

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Ports (PTG families, strategies, robot interface)
// ============================================================================
pub mod ptg;
pub mod robot;
pub mod strategies;

// ============================================================================
// Layer 3: Reactive decision pipeline
// ============================================================================
pub mod reactive;

// ============================================================================
// Layer 4: Navigation orchestration
// ============================================================================
pub mod navigation;

// ============================================================================
// Crate-wide config and errors
// ============================================================================
pub mod config;
pub mod error;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

pub use config::{NavCoreConfig, NavigatorConfig, ReactiveConfig, WaypointConfig};
pub use core::math;
pub use core::types::{
    Point2D, Pose2D, PoseHistory, RobotPoseVel, SpeedLimits, Twist2D, VelCmd,
};
pub use error::{NavError, Result};
pub use navigation::{
    NavState, NavTarget, ReactiveNavigator, SharedNavigator, Waypoint, WaypointSequence,
    WaypointStatus, WaypointStatusSequence,
};
pub use ptg::{ClearanceDiagram, TrajectoryGenerator};
pub use reactive::{CandidateMovement, NavLogRecord, SentVelCmd};
pub use robot::{ObstacleSnapshot, ObstacleSource, RobotInterface};
pub use strategies::{
    Decision, HolonomicInput, HolonomicMethod, HolonomicOutput, MotionOptimizer, StrategyRegistry,
};
