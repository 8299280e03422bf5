//! Shared test harness: a simulated robot, a straight-ray PTG family and
//! simple strategy implementations, enough to drive the navigator through
//! full scenarios without hardware.
#![allow(dead_code)] // each test binary uses a different subset

use disha_nav::{
    ClearanceDiagram, Decision, HolonomicInput, HolonomicMethod, HolonomicOutput, MotionOptimizer,
    NavigatorConfig, ObstacleSnapshot, ObstacleSource, Point2D, Pose2D, ReactiveNavigator,
    RobotInterface, StrategyRegistry, TrajectoryGenerator, Twist2D, VelCmd,
};
use std::f32::consts::PI;
use std::sync::{Arc, Mutex};

/// Events observed through the robot interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NavStart,
    NavEnd,
    NavEndDueToError,
    WaySeemsBlocked,
    WaypointReached(usize),
    NewWaypointTarget(usize),
}

#[derive(Debug, Default)]
pub struct RobotSim {
    pub pose: Pose2D,
    pub vel: Twist2D,
    pub clock: f64,
    pub last_cmd: VelCmd,
    pub frozen: bool,
    pub fail_pose_read: bool,
    pub fail_send: bool,
    pub events: Vec<Event>,
    pub sent_cmds: Vec<VelCmd>,
    pub nop_calls: u32,
    pub stop_calls: u32,
    pub emergency_stop_calls: u32,
    pub watchdog_running: bool,
}

impl RobotSim {
    /// Advance the simulation clock and integrate the last command.
    pub fn advance(&mut self, dt: f64) {
        self.clock += dt;
        if self.frozen {
            return;
        }
        let dt = dt as f32;
        let (sin_t, cos_t) = self.pose.phi.sin_cos();
        let vx = self.last_cmd.linear * cos_t - self.last_cmd.lateral * sin_t;
        let vy = self.last_cmd.linear * sin_t + self.last_cmd.lateral * cos_t;
        self.pose = Pose2D::new(
            self.pose.x + vx * dt,
            self.pose.y + vy * dt,
            self.pose.phi + self.last_cmd.angular * dt,
        );
        self.vel = Twist2D::new(vx, vy, self.last_cmd.angular);
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }
}

/// Cloneable handle implementing the robot interface over a shared sim.
#[derive(Clone, Default)]
pub struct MockRobot(pub Arc<Mutex<RobotSim>>);

impl MockRobot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sim(&self) -> std::sync::MutexGuard<'_, RobotSim> {
        self.0.lock().unwrap()
    }
}

impl RobotInterface for MockRobot {
    fn current_pose_and_speeds(&mut self) -> Result<(Pose2D, Twist2D, f64), String> {
        let sim = self.0.lock().unwrap();
        if sim.fail_pose_read {
            return Err("simulated odometry failure".to_string());
        }
        Ok((sim.pose, sim.vel, sim.clock))
    }

    fn change_speeds(&mut self, cmd: &VelCmd) -> bool {
        let mut sim = self.0.lock().unwrap();
        if sim.fail_send {
            return false;
        }
        sim.last_cmd = *cmd;
        sim.sent_cmds.push(*cmd);
        true
    }

    fn change_speeds_nop(&mut self) -> bool {
        let mut sim = self.0.lock().unwrap();
        sim.nop_calls += 1;
        true
    }

    fn stop(&mut self, is_emergency: bool) -> bool {
        let mut sim = self.0.lock().unwrap();
        sim.last_cmd = VelCmd::STOP;
        sim.vel = Twist2D::default();
        sim.stop_calls += 1;
        if is_emergency {
            sim.emergency_stop_calls += 1;
        }
        true
    }

    fn start_watchdog(&mut self, _timeout_ms: u32) {
        self.0.lock().unwrap().watchdog_running = true;
    }

    fn stop_watchdog(&mut self) {
        self.0.lock().unwrap().watchdog_running = false;
    }

    fn navigation_time(&self) -> f64 {
        self.0.lock().unwrap().clock
    }

    fn on_nav_start(&mut self) {
        self.0.lock().unwrap().events.push(Event::NavStart);
    }

    fn on_nav_end(&mut self) {
        self.0.lock().unwrap().events.push(Event::NavEnd);
    }

    fn on_nav_end_due_to_error(&mut self) {
        self.0.lock().unwrap().events.push(Event::NavEndDueToError);
    }

    fn on_way_seems_blocked(&mut self) {
        self.0.lock().unwrap().events.push(Event::WaySeemsBlocked);
    }

    fn on_waypoint_reached(&mut self, index: usize) {
        self.0
            .lock()
            .unwrap()
            .events
            .push(Event::WaypointReached(index));
    }

    fn on_new_waypoint_target(&mut self, index: usize) {
        self.0
            .lock()
            .unwrap()
            .events
            .push(Event::NewWaypointTarget(index));
    }
}

/// Obstacle source backed by a shared point list.
#[derive(Clone, Default)]
pub struct MockObstacles {
    pub points: Arc<Mutex<Vec<Point2D>>>,
    pub fail: Arc<Mutex<bool>>,
}

impl MockObstacles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_points(&self, points: Vec<Point2D>) {
        *self.points.lock().unwrap() = points;
    }
}

impl ObstacleSource for MockObstacles {
    fn sense(&mut self, now: f64) -> Result<ObstacleSnapshot, String> {
        if *self.fail.lock().unwrap() {
            return Err("simulated sensor failure".to_string());
        }
        Ok(ObstacleSnapshot {
            points: self.points.lock().unwrap().clone(),
            timestamp: now,
        })
    }
}

/// Straight-ray trajectory family: direction `k` drives a straight line at
/// `index_to_alpha(k)` with 0.1 m simulation steps.
pub struct RayPtg {
    pub paths: usize,
    pub ref_dist: f32,
    pub nop: bool,
    pub base_speed: f32,
}

impl RayPtg {
    pub fn new(ref_dist: f32, nop: bool) -> Self {
        Self {
            paths: 16,
            ref_dist,
            nop,
            base_speed: 0.5,
        }
    }
}

impl TrajectoryGenerator for RayPtg {
    fn description(&self) -> String {
        format!("ray ptg ({} paths)", self.paths)
    }
    fn path_count(&self) -> usize {
        self.paths
    }
    fn alpha_to_index(&self, alpha: f32) -> usize {
        let n = self.paths as f32;
        let idx = (0.5 * (n * (1.0 + alpha / PI) - 1.0)).round() as i64;
        idx.clamp(0, self.paths as i64 - 1) as usize
    }
    fn index_to_alpha(&self, k: usize) -> f32 {
        PI * (-1.0 + 2.0 * (k as f32 + 0.5) / self.paths as f32)
    }
    fn ref_distance(&self) -> f32 {
        self.ref_dist
    }
    fn init_collision_grid(&mut self) {}
    fn inverse_map(&self, x: f32, y: f32) -> Option<(usize, f32)> {
        let d = (x * x + y * y).sqrt();
        if d > self.ref_dist {
            return None;
        }
        Some((self.alpha_to_index(y.atan2(x)), d / self.ref_dist))
    }
    fn path_pose(&self, k: usize, step: u32) -> Pose2D {
        let a = self.index_to_alpha(k);
        let d = self.path_dist(k, step);
        Pose2D::new(a.cos() * d, a.sin() * d, 0.0)
    }
    fn path_dist(&self, _k: usize, step: u32) -> f32 {
        step as f32 * 0.1
    }
    fn step_for_dist(&self, _k: usize, dist: f32) -> Option<u32> {
        if dist < 0.0 || dist > self.ref_dist {
            return None;
        }
        Some((dist / 0.1).round() as u32)
    }
    fn step_duration(&self) -> f64 {
        // One step per 0.1 m at the base speed.
        0.1 / self.base_speed as f64
    }
    fn update_current_robot_vel(&mut self, _vel: &Twist2D) {}
    fn direction_to_motion_command(&self, k: usize) -> VelCmd {
        let a = self.index_to_alpha(k);
        VelCmd::new(self.base_speed * a.cos(), self.base_speed * a.sin(), 0.0)
    }
    fn update_tp_obstacle(&self, ox: f32, oy: f32, tp_obstacles: &mut [f32]) {
        if let Some((k, _)) = self.inverse_map(ox, oy) {
            let d = (ox * ox + oy * oy).sqrt();
            tp_obstacles[k] = tp_obstacles[k].min(d);
        }
    }
    fn update_clearance(&self, ox: f32, oy: f32, clearance: &mut ClearanceDiagram) {
        if let Some((k, d_norm)) = self.inverse_map(ox, oy) {
            clearance.update(k, d_norm, 0.0);
        }
    }
    fn supports_nop_cmd(&self) -> bool {
        self.nop
    }
    fn max_nop_time(&self, _k: usize) -> f64 {
        2.0
    }
}

/// Holonomic method that always heads straight at the TP target at full
/// speed.
pub struct TowardTarget;

impl HolonomicMethod for TowardTarget {
    fn initialize(&mut self, _params: &toml::value::Table) -> disha_nav::Result<()> {
        Ok(())
    }
    fn enable_approach_target_slowdown(&mut self, _enable: bool) {}
    fn navigate(&mut self, input: &HolonomicInput<'_>) -> HolonomicOutput {
        HolonomicOutput {
            direction: input.target.y.atan2(input.target.x),
            speed: 1.0,
        }
    }
}

/// Optimizer scoring viable candidates by free distance plus hysteresis,
/// which makes it prefer an allowed NOP continuation.
pub struct GreedyOptimizer;

impl MotionOptimizer for GreedyOptimizer {
    fn configure(&mut self, _params: &toml::value::Table) -> disha_nav::Result<()> {
        Ok(())
    }
    fn decide(&mut self, candidates: &[disha_nav::CandidateMovement]) -> Decision {
        let mut evaluations = vec![0.0; candidates.len()];
        let mut best: Option<usize> = None;
        for (i, cm) in candidates.iter().enumerate() {
            if !cm.is_viable() {
                continue;
            }
            let score = cm.prop("colision_free_distance") + cm.prop("hysteresis");
            evaluations[i] = score;
            if best.map_or(true, |b| score > evaluations[b]) {
                best = Some(i);
            }
        }
        Decision { best, evaluations }
    }
}

/// Registry with the test strategies registered.
pub fn test_registry() -> StrategyRegistry {
    let mut registry = StrategyRegistry::new();
    registry.register_holonomic("toward_target", || Box::new(TowardTarget));
    registry.register_optimizer("greedy", || Box::new(GreedyOptimizer));
    registry
}

/// Default test configuration for the test strategies.
pub fn test_config() -> NavigatorConfig {
    NavigatorConfig::with_strategies("toward_target", "greedy")
}

/// Fully wired navigator over the simulated robot.
pub fn make_navigator(
    robot: MockRobot,
    obstacles: MockObstacles,
    config: NavigatorConfig,
    ref_dist: f32,
    nop: bool,
) -> ReactiveNavigator<MockRobot> {
    let registry = test_registry();
    let ptgs: Vec<Box<dyn TrajectoryGenerator>> = vec![Box::new(RayPtg::new(ref_dist, nop))];
    let mut nav = ReactiveNavigator::new(robot, Box::new(obstacles), ptgs, config, &registry)
        .expect("navigator construction");
    nav.initialize();
    nav
}

/// Step the navigator `n` times, advancing the simulated robot by `dt`
/// before each tick.
pub fn run_ticks(nav: &mut ReactiveNavigator<MockRobot>, robot: &MockRobot, n: usize, dt: f64) {
    for _ in 0..n {
        robot.sim().advance(dt);
        nav.step();
    }
}
