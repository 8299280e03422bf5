//! The reactive navigator: lifecycle state machine and per-tick driver.
//!
//! [`ReactiveNavigator`] owns all navigation state and exposes the control
//! API (`navigate`, `cancel`, `suspend`, `resume`, `reset_error`, `step`).
//! An external driver must call [`step`](ReactiveNavigator::step)
//! periodically (5-20 Hz is typical); the navigator spawns no threads.
//! Wrap it in [`SharedNavigator`](crate::navigation::SharedNavigator) when
//! several threads need access.

use crate::config::NavigatorConfig;
use crate::core::math::point_segment_distance;
use crate::core::types::{Point2D, Pose2D, PoseHistory, RobotPoseVel, VelCmd};
use crate::error::{NavError, Result};
use crate::navigation::state::NavState;
use crate::navigation::target::NavTarget;
use crate::navigation::waypoints::WaypointStatusSequence;
use crate::ptg::TrajectoryGenerator;
use crate::reactive::{DelayModel, NavLogRecord, PtgTickInfo, SentVelCmd};
use crate::robot::{ObstacleSource, RobotInterface};
use crate::strategies::{HolonomicMethod, MotionOptimizer, StrategyRegistry};
use parking_lot::Mutex;
use std::sync::Arc;

/// Watchdog timeout armed while navigating.
const WATCHDOG_TIMEOUT_MS: u32 = 1000;

/// Minimum robot-clock interval between two pose reads.
const MIN_TIME_BETWEEN_POSE_UPDATES: f64 = 20e-3;

/// Per-PTG tick data older than this is useless for reachability queries.
const PER_PTG_INFO_MAX_AGE: f64 = 0.5;

/// Reactive TP-space navigator for a mobile robot.
///
/// Generic over the robot interface so simulators and real platforms plug
/// in without dynamic dispatch on the hot path. The trajectory families and
/// the strategy objects are trait objects chosen at construction.
pub struct ReactiveNavigator<R: RobotInterface> {
    pub(crate) robot: R,
    pub(crate) config: NavigatorConfig,

    pub(crate) ptgs: Vec<Box<dyn TrajectoryGenerator>>,
    pub(crate) holonomic: Vec<Box<dyn HolonomicMethod>>,
    pub(crate) decider: Box<dyn MotionOptimizer>,
    pub(crate) obstacle_source: Box<dyn ObstacleSource>,

    // Lifecycle
    pub(crate) state: NavState,
    pub(crate) last_state: NavState,
    pub(crate) nav_params: Option<NavTarget>,
    pub(crate) nav_end_event_sent: bool,
    pub(crate) last_target_reached: bool,

    // Robot state tracking
    pub(crate) cur_pose_vel: RobotPoseVel,
    pub(crate) last_pose_update_time: f64,
    pub(crate) pose_history: PoseHistory,

    // Stall alarm
    pub(crate) alarm_min_dist: f32,
    pub(crate) alarm_last_improvement_time: f64,

    // Waypoint sequencing
    pub(crate) waypoint_status: WaypointStatusSequence,

    // Reactive pipeline state
    pub(crate) init_done: bool,
    pub(crate) ptgs_must_reinit: bool,
    pub(crate) delays: DelayModel,
    pub(crate) last_target_pose: Option<Pose2D>,
    pub(crate) per_ptg: Vec<PtgTickInfo>,
    pub(crate) per_ptg_timestamp: Option<f64>,
    pub(crate) last_sent_cmd: SentVelCmd,
    pub(crate) last_cmd: Option<VelCmd>,
    pub(crate) last_log: Arc<Mutex<Option<NavLogRecord>>>,
}

impl<R: RobotInterface> ReactiveNavigator<R> {
    /// Build a navigator.
    ///
    /// One holonomic method instance is created per PTG; both strategy
    /// slots are resolved from `registry` by the names in `config`.
    /// Fails on an empty PTG set, invalid configuration or unregistered
    /// strategy names; none of these can occur later at runtime.
    pub fn new(
        robot: R,
        obstacle_source: Box<dyn ObstacleSource>,
        ptgs: Vec<Box<dyn TrajectoryGenerator>>,
        config: NavigatorConfig,
        registry: &StrategyRegistry,
    ) -> Result<Self> {
        config.validate()?;
        if ptgs.is_empty() {
            return Err(NavError::Config("no PTGs configured".to_string()));
        }

        let mut holonomic = Vec::with_capacity(ptgs.len());
        for _ in 0..ptgs.len() {
            let mut method = registry.create_holonomic(&config.reactive.holonomic_method)?;
            method.initialize(&config.reactive.holonomic_params)?;
            holonomic.push(method);
        }

        let mut decider = registry.create_optimizer(&config.reactive.motion_decider_method)?;
        decider.configure(&config.reactive.decider_params)?;

        Ok(Self {
            robot,
            config,
            ptgs,
            holonomic,
            decider,
            obstacle_source,
            state: NavState::Idle,
            last_state: NavState::Idle,
            nav_params: None,
            nav_end_event_sent: false,
            last_target_reached: false,
            cur_pose_vel: RobotPoseVel::default(),
            last_pose_update_time: f64::NEG_INFINITY,
            pose_history: PoseHistory::new(),
            alarm_min_dist: f32::MAX,
            alarm_last_improvement_time: 0.0,
            waypoint_status: WaypointStatusSequence::default(),
            init_done: false,
            ptgs_must_reinit: true,
            delays: DelayModel::new(),
            last_target_pose: None,
            per_ptg: Vec::new(),
            per_ptg_timestamp: None,
            last_sent_cmd: SentVelCmd::default(),
            last_cmd: None,
            last_log: Arc::new(Mutex::new(None)),
        })
    }

    /// Compute (or recompute) the PTG collision grids. Must be called once
    /// before the first navigation request.
    pub fn initialize(&mut self) {
        self.per_ptg_timestamp = None;
        for ptg in &mut self.ptgs {
            ptg.init_collision_grid();
        }
        self.ptgs_must_reinit = false;
        self.init_done = true;
        log::debug!("initialized {} PTG collision grids", self.ptgs.len());
    }

    /// Current lifecycle state.
    pub fn current_state(&self) -> NavState {
        self.state
    }

    /// The navigation request currently being executed, if any.
    pub fn current_target(&self) -> Option<&NavTarget> {
        self.nav_params.as_ref()
    }

    /// Handle to the latest per-tick decision snapshot.
    pub fn last_log_record(&self) -> Arc<Mutex<Option<NavLogRecord>>> {
        Arc::clone(&self.last_log)
    }

    /// Access the robot interface (e.g. to drive a simulator in tests).
    pub fn robot_mut(&mut self) -> &mut R {
        &mut self.robot
    }

    /// Start a new single-target navigation.
    ///
    /// Relative targets are resolved against the current robot pose here,
    /// at acceptance time.
    pub fn navigate(&mut self, params: &NavTarget) -> Result<()> {
        if !self.init_done {
            return Err(NavError::NotInitialized);
        }
        self.nav_end_event_sent = false;
        self.last_target_reached = false;

        let mut accepted = params.clone();
        if accepted.relative {
            self.update_pose_and_speeds()?;
            accepted.target = self.cur_pose_vel.pose.compose(&accepted.target);
            accepted.relative = false;
        }

        log::info!(
            "navigate to ({:.3}, {:.3}, {:.3} rad), allowed dist {:.3} m{}",
            accepted.target.x,
            accepted.target.y,
            accepted.target.phi,
            accepted.allowed_distance,
            if accepted.intermediary_waypoint {
                " (intermediary)"
            } else {
                ""
            }
        );

        self.nav_params = Some(accepted);
        self.state = NavState::Navigating;

        self.alarm_min_dist = f32::MAX;
        self.alarm_last_improvement_time = self.robot.navigation_time();
        Ok(())
    }

    /// Cancel the current navigation and stop the robot (non-emergency).
    ///
    /// Also clears any active waypoint sequence.
    pub fn cancel(&mut self) {
        log::debug!("cancel() called");
        self.waypoint_status = WaypointStatusSequence::default();
        self.state = NavState::Idle;
        self.last_target_reached = false;
        self.stop_robot(false);
    }

    /// Pause the current navigation.
    pub fn suspend(&mut self) {
        log::debug!("suspend() called");
        if self.state == NavState::Navigating {
            self.state = NavState::Suspended;
        }
    }

    /// Resume a suspended navigation.
    pub fn resume(&mut self) {
        log::debug!("resume() called");
        if self.state == NavState::Suspended {
            self.state = NavState::Navigating;
        }
    }

    /// Clear an error state back to idle.
    pub fn reset_error(&mut self) {
        log::debug!("reset_error() called");
        if self.state == NavState::NavError {
            self.state = NavState::Idle;
        }
    }

    /// Run one navigation tick.
    ///
    /// Must be called periodically by an external driver. Waypoint
    /// sequencing runs first so waypoint events precede end-of-navigation
    /// events.
    pub fn step(&mut self) {
        self.waypoint_navigation_step();
        self.navigation_step_core();
    }

    fn navigation_step_core(&mut self) {
        let prev_state = self.state;
        match self.state {
            NavState::Idle | NavState::Suspended => {
                if self.last_state == NavState::Navigating {
                    log::info!("navigation stopped");
                    self.robot.stop_watchdog();
                }
            }
            NavState::NavError => {
                if self.last_state == NavState::Navigating {
                    log::error!("stopping navigation due to NAV_ERROR state");
                    self.robot.on_nav_end_due_to_error();
                    self.stop_robot(false);
                    self.robot.stop_watchdog();
                }
            }
            NavState::Navigating => {
                if let Err(e) = self.navigating_step() {
                    log::error!("navigation step failed: {}", e);
                }
            }
        }
        self.last_state = prev_state;
    }

    fn navigating_step(&mut self) -> Result<()> {
        if self.last_state != NavState::Navigating {
            log::info!("starting navigation, watchdog armed");
            self.robot.start_watchdog(WATCHDOG_TIMEOUT_MS);
            self.pose_history.clear();
            self.on_start_new_navigation();
        }
        if self.last_state == NavState::Idle {
            self.robot.on_nav_start();
        }

        self.update_pose_and_speeds()?;

        let Some(params) = self.nav_params.clone() else {
            log::warn!("navigating without a target, going idle");
            self.state = NavState::Idle;
            return Ok(());
        };

        // Arrival detection against the segment swept since the last tick,
        // so fast robots cannot step over a small arrival radius.
        let seg_a = self.cur_pose_vel.pose.point();
        let seg_b = self
            .pose_history
            .previous()
            .map(|(_, p)| p.point())
            .unwrap_or(seg_a);
        let target_point = params.target.point();
        let target_dist = point_segment_distance(&target_point, &seg_a, &seg_b);

        let event_dist = if self.config.navigator.dist_to_target_for_sending_event > 0.0 {
            self.config.navigator.dist_to_target_for_sending_event
        } else {
            params.allowed_distance
        };
        if !params.intermediary_waypoint && !self.nav_end_event_sent && target_dist < event_dist {
            self.nav_end_event_sent = true;
            self.robot.on_nav_end();
        }

        if target_dist < params.allowed_distance {
            self.last_target_reached = true;
            if !params.intermediary_waypoint {
                self.stop_robot(false);
            }
            self.state = NavState::Idle;
            log::warn!(
                "navigation target ({:.3}, {:.3}) was reached",
                params.target.x,
                params.target.y
            );
            if !params.intermediary_waypoint && !self.nav_end_event_sent {
                self.nav_end_event_sent = true;
                self.robot.on_nav_end();
            }
            return Ok(());
        }

        // Stall alarm: abort when the distance to the target has not
        // improved for too long.
        let now = self.robot.navigation_time();
        if target_dist < self.alarm_min_dist {
            self.alarm_min_dist = target_dist;
            self.alarm_last_improvement_time = now;
        } else if now - self.alarm_last_improvement_time
            > self
                .config
                .navigator
                .alarm_seems_not_approaching_target_timeout
        {
            log::warn!("timeout approaching the target expired, aborting navigation");
            self.state = NavState::NavError;
            self.robot.on_way_seems_blocked();
            return Ok(());
        }

        self.reactive_step(&params)
    }

    /// Reset per-navigation state when a fresh navigation starts.
    fn on_start_new_navigation(&mut self) {
        self.last_pose_update_time = f64::NEG_INFINITY;
        self.last_sent_cmd.reset();
    }

    /// Refresh the robot pose/velocity snapshot, rate-limited to one real
    /// read per 20 ms of robot time.
    pub(crate) fn update_pose_and_speeds(&mut self) -> Result<()> {
        let robot_time = self.robot.navigation_time();
        if self.last_pose_update_time.is_finite() {
            let age = robot_time - self.last_pose_update_time;
            if age < MIN_TIME_BETWEEN_POSE_UPDATES {
                log::trace!(
                    "skipping pose read, previous one is only {:.1} ms old",
                    age * 1e3
                );
                return Ok(());
            }
        }

        match self.robot.current_pose_and_speeds() {
            Ok((pose, vel_global, timestamp)) => {
                self.cur_pose_vel = RobotPoseVel::from_sensed(pose, vel_global, timestamp);
                self.last_pose_update_time = robot_time;
                self.pose_history.push(timestamp, pose);
                Ok(())
            }
            Err(msg) => {
                log::error!("failed to read robot pose and speeds: {}", msg);
                self.state = NavState::NavError;
                self.stop_robot(true);
                Err(NavError::PoseReadFailure)
            }
        }
    }

    /// Stop the robot and latch the error state.
    pub(crate) fn do_emergency_stop(&mut self, msg: &str) {
        self.stop_robot(true);
        self.state = NavState::NavError;
        log::error!("{}", msg);
    }

    pub(crate) fn stop_robot(&mut self, is_emergency: bool) -> bool {
        let ok = self.robot.stop(is_emergency);
        if !ok {
            log::error!(
                "robot rejected {} stop request",
                if is_emergency { "emergency" } else { "normal" }
            );
        }
        ok
    }

    /// Whether a point in the robot frame is reachable through any PTG
    /// given the TP-obstacles of the current tick.
    ///
    /// Returns false when the per-PTG data is missing or older than 500 ms.
    pub fn is_relative_point_reachable(&self, wp_local: &Point2D) -> bool {
        let Some(stamp) = self.per_ptg_timestamp else {
            return false;
        };
        if self.per_ptg.len() < self.ptgs.len()
            || self.robot.navigation_time() - stamp > PER_PTG_INFO_MAX_AGE
        {
            return false;
        }

        for (i, ptg) in self.ptgs.iter().enumerate() {
            let info = &self.per_ptg[i];
            if info.tp_obstacles.len() != ptg.path_count() {
                continue; // PTG unused this tick (e.g. target out of domain)
            }
            let Some((k, d_norm)) = ptg.inverse_map(wp_local.x, wp_local.y) else {
                continue;
            };
            if info.tp_obstacles[k] > 1.01 * d_norm {
                return true;
            }
        }
        false
    }
}
