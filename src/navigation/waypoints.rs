//! Waypoint sequences and the look-ahead waypoint sequencer.
//!
//! The sequencer turns a list of waypoints into a stream of single-target
//! navigation requests. Each tick it checks whether the current waypoint
//! was crossed, scans forward for reachable waypoints that can be skipped
//! to, and re-targets the inner navigator whenever the active goal changes.

use crate::core::math::point_segment_distance;
use crate::core::types::{Point2D, Pose2D};
use crate::error::{NavError, Result};
use crate::navigation::navigator::ReactiveNavigator;
use crate::navigation::target::NavTarget;
use crate::robot::RobotInterface;
use serde::{Deserialize, Serialize};

/// A single waypoint of a navigation sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Target point (meters).
    pub target: Point2D,
    /// Required heading at the waypoint, if any.
    pub heading: Option<f32>,
    /// Distance (meters) at which the waypoint counts as reached.
    pub allowed_distance: f32,
    /// Whether the sequencer may skip past this waypoint when a later one
    /// is already reachable.
    pub allow_skip: bool,
}

impl Waypoint {
    /// Waypoint at `(x, y)` with default tolerance, skippable.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            target: Point2D::new(x, y),
            heading: None,
            allowed_distance: 0.5,
            allow_skip: true,
        }
    }
}

/// An ordered waypoint navigation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaypointSequence {
    pub waypoints: Vec<Waypoint>,
}

/// Execution status of one waypoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointStatus {
    /// The waypoint definition.
    pub waypoint: Waypoint,
    /// Consecutive ticks this waypoint was seen as reachable.
    pub counter_seen_reachable: u32,
    /// Whether the robot reached (or skipped past) this waypoint.
    pub reached: bool,
}

/// Execution status of a whole waypoint sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaypointStatusSequence {
    /// Per-waypoint status, in order.
    pub waypoints: Vec<WaypointStatus>,
    /// Index of the active goal; `None` until sequencing starts.
    pub current_goal: Option<usize>,
    /// Whether the final waypoint was reached.
    pub final_goal_reached: bool,
    /// Robot pose observed on the previous sequencer tick.
    pub last_robot_pose: Option<Pose2D>,
    /// Robot-clock time the sequence was accepted.
    pub started_at: f64,
}

impl WaypointStatusSequence {
    /// Fresh status for a new request.
    pub fn from_request(request: &WaypointSequence, now: f64) -> Self {
        Self {
            waypoints: request
                .waypoints
                .iter()
                .map(|w| WaypointStatus {
                    waypoint: w.clone(),
                    counter_seen_reachable: 0,
                    reached: false,
                })
                .collect(),
            current_goal: None,
            final_goal_reached: false,
            last_robot_pose: None,
            started_at: now,
        }
    }

    /// Whether a sequence is loaded and not yet completed.
    pub fn is_active(&self) -> bool {
        !self.waypoints.is_empty() && !self.final_goal_reached
    }
}

impl<R: RobotInterface> ReactiveNavigator<R> {
    /// Start navigating a waypoint sequence.
    ///
    /// Replaces any previous sequence wholesale. The first sequencer tick
    /// issues the initial single-target request.
    pub fn navigate_waypoints(&mut self, request: &WaypointSequence) -> Result<()> {
        if request.waypoints.is_empty() {
            return Err(NavError::Config("waypoint list is empty".to_string()));
        }
        if !self.init_done {
            return Err(NavError::NotInitialized);
        }
        let now = self.robot.navigation_time();
        self.waypoint_status = WaypointStatusSequence::from_request(request, now);
        log::info!(
            "accepted waypoint sequence with {} waypoints",
            request.waypoints.len()
        );
        Ok(())
    }

    /// Current waypoint navigation status.
    pub fn waypoint_status(&self) -> WaypointStatusSequence {
        self.waypoint_status.clone()
    }

    /// Waypoint sequencing, run before the state-machine tick.
    pub(crate) fn waypoint_navigation_step(&mut self) {
        if self.waypoint_status.waypoints.is_empty() || self.waypoint_status.final_goal_reached {
            return;
        }

        if self.update_pose_and_speeds().is_err() {
            return;
        }
        let robot_pose = self.cur_pose_vel.pose;

        // Robot motion segment since the previous sequencer tick; degenerate
        // on the first tick.
        let seg_a = robot_pose.point();
        let seg_b = self
            .waypoint_status
            .last_robot_pose
            .map(|p| p.point())
            .unwrap_or(seg_a);
        self.waypoint_status.last_robot_pose = Some(robot_pose);

        let n = self.waypoint_status.waypoints.len();
        let prev_goal = self.waypoint_status.current_goal;

        // 1) Did the robot cross the current waypoint?
        if let Some(ci) = self.waypoint_status.current_goal {
            let wp = &self.waypoint_status.waypoints[ci];
            let dist = point_segment_distance(&wp.waypoint.target, &seg_a, &seg_b);
            if dist < wp.waypoint.allowed_distance || self.last_target_reached {
                log::debug!(
                    "waypoint {}/{} reached (segment dist {:.3} m, allowed {:.3} m, inner navigator: {})",
                    ci + 1,
                    n,
                    dist,
                    wp.waypoint.allowed_distance,
                    self.last_target_reached
                );
                self.waypoint_status.waypoints[ci].reached = true;
                self.robot.on_waypoint_reached(ci);
                if ci + 1 < n {
                    self.waypoint_status.current_goal = Some(ci + 1);
                } else {
                    self.waypoint_status.final_goal_reached = true;
                }
            }
        }

        // 2) Look-ahead: scan forward for a reachable waypoint to skip to.
        if !self.waypoint_status.final_goal_reached {
            if let Some(ci) = self.waypoint_status.current_goal {
                let max_skip_dist = self.config.waypoints.max_distance_to_allow_skip_waypoint;
                let min_confirm = self.config.waypoints.min_timesteps_confirm_skip_waypoints;
                let mut most_advanced = ci;

                for idx in ci..n {
                    let (target, allow_skip) = {
                        let wp = &self.waypoint_status.waypoints[idx].waypoint;
                        (wp.target, wp.allow_skip)
                    };
                    let wp_local = robot_pose.inverse_transform_point(&target);
                    if max_skip_dist > 0.0 && wp_local.norm() > max_skip_dist {
                        continue; // too far ahead to judge
                    }
                    if self.is_relative_point_reachable(&wp_local) {
                        let wp = &mut self.waypoint_status.waypoints[idx];
                        wp.counter_seen_reachable += 1;
                        if wp.counter_seen_reachable >= min_confirm {
                            most_advanced = idx;
                        }
                    }
                    if !allow_skip {
                        break; // must pass through this one
                    }
                }

                if most_advanced > ci {
                    self.waypoint_status.current_goal = Some(most_advanced);
                    for k in ci..most_advanced {
                        self.waypoint_status.waypoints[k].reached = true;
                        self.robot.on_waypoint_reached(k);
                    }
                }
            }
        }

        // 3) Not started yet: begin with the first waypoint.
        if self.waypoint_status.current_goal.is_none() {
            self.waypoint_status.current_goal = Some(0);
        }

        // 4) Re-target the inner navigator when the active goal changed.
        if self.waypoint_status.current_goal != prev_goal {
            if let Some(ci) = self.waypoint_status.current_goal {
                let wp = self.waypoint_status.waypoints[ci].waypoint.clone();
                let is_final = ci + 1 == n;
                self.robot.on_new_waypoint_target(ci);
                let request = NavTarget {
                    target: Pose2D::new(wp.target.x, wp.target.y, wp.heading.unwrap_or(0.0)),
                    allowed_distance: wp.allowed_distance,
                    relative: false,
                    intermediary_waypoint: !is_final,
                    restrict_ptg_indices: Vec::new(),
                };
                if let Err(e) = self.navigate(&request) {
                    log::error!("failed to issue waypoint target {}: {}", ci, e);
                }
            }
        }
    }
}
