//! Latency estimation and pose-extrapolation offsets.
//!
//! Sensor observations, pose reads and actuator commands all happen at
//! slightly different instants within a tick. The delay model keeps
//! exponentially-weighted estimates of those per-stage latencies and, when
//! enabled, extrapolates the robot pose to the instants that matter: when
//! the obstacles were sensed and when the next command will take effect.

use crate::core::types::{Pose2D, Twist2D};

/// Filter weight shared by all latency estimators.
const LOWPASS_ALPHA: f64 = 0.7;

/// Offsets beyond this many seconds make extrapolation unreliable.
const EXTRAPOLATION_WARN_LIMIT: f64 = 1.25;

/// First-order exponential low-pass filter.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    alpha: f64,
    state: Option<f64>,
}

impl LowPassFilter {
    /// Filter with weight `alpha` and no initial state.
    pub fn new(alpha: f64) -> Self {
        Self { alpha, state: None }
    }

    /// Filter seeded with an initial output.
    pub fn with_initial(alpha: f64, initial: f64) -> Self {
        Self {
            alpha,
            state: Some(initial),
        }
    }

    /// Feed a sample, returning the new filtered output.
    pub fn filter(&mut self, x: f64) -> f64 {
        let y = match self.state {
            Some(prev) => self.alpha * prev + (1.0 - self.alpha) * x,
            None => x,
        };
        self.state = Some(y);
        y
    }

    /// Last filtered output, 0.0 before any sample.
    pub fn output(&self) -> f64 {
        self.state.unwrap_or(0.0)
    }
}

/// Pose-extrapolation offsets for one tick.
#[derive(Debug, Clone, Default)]
pub struct DelayOffsets {
    /// Robot displacement between the pose read and the obstacle sensing.
    pub rel_pose_sense: Pose2D,
    /// Robot displacement between the pose read and the command taking
    /// effect.
    pub rel_pose_vel_cmd: Pose2D,
    /// PTG evaluation origin expressed in the sense frame
    /// (`rel_pose_vel_cmd` relative to `rel_pose_sense`).
    pub rel_pose_ptg_origin_wrt_sense: Pose2D,
    /// Signed time offset pose-read → sense (seconds).
    pub sense_offset: f64,
    /// Signed time offset pose-read → command (seconds).
    pub cmd_offset: f64,
}

/// Low-pass latency estimators plus the tick-period tracker.
#[derive(Debug, Clone)]
pub struct DelayModel {
    /// Tick start → obstacle observation, filtered.
    pub t_obs: LowPassFilter,
    /// Tick start → pose read, filtered.
    pub t_pose: LowPassFilter,
    /// Duration of the send-command call, filtered.
    pub t_change: LowPassFilter,
    /// Tick start → command send, filtered.
    pub t_send: LowPassFilter,
    /// Mean tick period, used for the speed-filter blending weight.
    pub mean_period: LowPassFilter,
    last_tick_time: Option<f64>,
}

impl DelayModel {
    pub fn new() -> Self {
        Self {
            t_obs: LowPassFilter::new(LOWPASS_ALPHA),
            t_pose: LowPassFilter::new(LOWPASS_ALPHA),
            t_change: LowPassFilter::new(LOWPASS_ALPHA),
            t_send: LowPassFilter::new(LOWPASS_ALPHA),
            mean_period: LowPassFilter::with_initial(LOWPASS_ALPHA, 0.1),
            last_tick_time: None,
        }
    }

    /// Register the start of a tick and update the period estimate.
    pub fn note_tick_start(&mut self, now: f64) {
        if let Some(prev) = self.last_tick_time {
            let period = now - prev;
            if period > 0.0 {
                if period > 1.5 * self.mean_period.output() {
                    log::warn!(
                        "suspicious execution period {:.1} ms, far above the average of {:.1} ms",
                        period * 1e3,
                        self.mean_period.output() * 1e3
                    );
                }
                self.mean_period.filter(period);
            }
        }
        self.last_tick_time = Some(now);
    }

    /// Blending weight for the velocity command filter.
    pub fn speed_filter_beta(&self, tau: f64) -> f32 {
        let period = self.mean_period.output();
        (period / (period + tau)) as f32
    }

    /// Compute this tick's extrapolation offsets.
    ///
    /// With the model disabled, all offsets are identity so the PTG origin
    /// coincides with the sense frame.
    pub fn compute_offsets(
        &mut self,
        enabled: bool,
        tick_start: f64,
        obstacles_timestamp: f64,
        pose_timestamp: f64,
        vel_local: &Twist2D,
    ) -> DelayOffsets {
        if !enabled {
            return DelayOffsets::default();
        }

        let timoff_obstacles = obstacles_timestamp - tick_start;
        self.t_obs.filter(timoff_obstacles);

        let timoff_pose = pose_timestamp - tick_start;
        self.t_pose.filter(timoff_pose);

        let sense_offset = timoff_obstacles - timoff_pose;
        let cmd_offset = self.t_send.output() + 0.5 * self.t_change.output() - timoff_pose;

        if sense_offset.abs() > EXTRAPOLATION_WARN_LIMIT {
            log::warn!(
                "pose-to-sense offset {:.3} s is too large, path extrapolation may be inaccurate",
                sense_offset
            );
        }
        if cmd_offset.abs() > EXTRAPOLATION_WARN_LIMIT {
            log::warn!(
                "pose-to-command offset {:.3} s is too large, path extrapolation may be inaccurate",
                cmd_offset
            );
        }

        let rel_pose_sense = extrapolate_pose(vel_local, sense_offset);
        let rel_pose_vel_cmd = extrapolate_pose(vel_local, cmd_offset);
        let rel_pose_ptg_origin_wrt_sense = rel_pose_vel_cmd.relative_to(&rel_pose_sense);

        DelayOffsets {
            rel_pose_sense,
            rel_pose_vel_cmd,
            rel_pose_ptg_origin_wrt_sense,
            sense_offset,
            cmd_offset,
        }
    }
}

impl Default for DelayModel {
    fn default() -> Self {
        Self::new()
    }
}

/// First-order pose extrapolation from a body-frame twist.
fn extrapolate_pose(vel: &Twist2D, dt: f64) -> Pose2D {
    let dt = dt as f32;
    Pose2D::new(vel.vx * dt, vel.vy * dt, vel.omega * dt)
}
