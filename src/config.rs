//! Configuration loading for DishaNav.

use crate::core::types::SpeedLimits;
use crate::error::{NavError, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure.
#[derive(Clone, Debug, Deserialize)]
pub struct NavigatorConfig {
    #[serde(default)]
    pub navigator: NavCoreConfig,
    #[serde(default)]
    pub waypoints: WaypointConfig,
    pub reactive: ReactiveConfig,
}

/// Parameters of the navigator state machine.
#[derive(Clone, Debug, Deserialize)]
pub struct NavCoreConfig {
    /// Distance (meters) at which the navigation-end event fires ahead of
    /// actual arrival. Zero means "use the request's allowed distance".
    #[serde(default)]
    pub dist_to_target_for_sending_event: f32,

    /// Seconds without getting closer to the target before navigation is
    /// aborted with a way-blocked event (default: 30).
    #[serde(default = "default_alarm_timeout")]
    pub alarm_seems_not_approaching_target_timeout: f64,
}

/// Parameters of the waypoint sequencer.
#[derive(Clone, Debug, Deserialize)]
pub struct WaypointConfig {
    /// Maximum distance (meters) at which a future waypoint may be
    /// considered for skipping. Non-positive means unlimited.
    #[serde(default = "default_max_skip_distance")]
    pub max_distance_to_allow_skip_waypoint: f32,

    /// Number of consecutive ticks a future waypoint must be seen as
    /// reachable before the sequencer advances to it (default: 1).
    #[serde(default = "default_min_timesteps_confirm_skip")]
    pub min_timesteps_confirm_skip_waypoints: u32,
}

/// Parameters of the reactive decision pipeline.
#[derive(Clone, Debug, Deserialize)]
pub struct ReactiveConfig {
    /// Registered name of the holonomic method (required).
    pub holonomic_method: String,

    /// Registered name of the motion optimizer (required).
    pub motion_decider_method: String,

    /// Time constant (seconds) of the first-order filter applied to issued
    /// velocity commands. Zero disables filtering.
    #[serde(default)]
    pub speedfilter_tau: f64,

    /// Normalized distance below which the safety ramp forces a stop.
    #[serde(default = "default_secure_distance_start")]
    pub secure_distance_start: f32,

    /// Normalized distance above which the safety ramp allows full speed.
    #[serde(default = "default_secure_distance_end")]
    pub secure_distance_end: f32,

    /// Whether to compensate sensor and actuator latencies by pose
    /// extrapolation (default: false).
    #[serde(default)]
    pub use_delays_model: bool,

    /// Maximum distance (meters) between the predicted and the actual robot
    /// position before a NOP continuation is rejected.
    #[serde(default = "default_max_mismatch")]
    pub max_distance_predicted_actual_path: f32,

    /// Maximum displacement (meters) since the last command for which the
    /// cheaper time-based NOP path prediction is used; beyond it the PTG
    /// inverse mapping is consulted instead.
    #[serde(default = "default_max_timebased_dist")]
    pub max_dist_for_timebased_path_prediction: f32,

    /// Whether to compute clearance diagrams alongside TP-obstacles.
    #[serde(default)]
    pub evaluate_clearance: bool,

    /// Absolute per-component robot speed limits.
    #[serde(default)]
    pub robot_absolute_speed_limits: SpeedLimits,

    /// Parameter bag handed to the holonomic method's `initialize`.
    #[serde(default)]
    pub holonomic_params: toml::value::Table,

    /// Parameter bag handed to the optimizer's `configure`.
    #[serde(default)]
    pub decider_params: toml::value::Table,
}

fn default_alarm_timeout() -> f64 {
    30.0
}
fn default_max_skip_distance() -> f32 {
    -1.0
}
fn default_min_timesteps_confirm_skip() -> u32 {
    1
}
fn default_secure_distance_start() -> f32 {
    0.05
}
fn default_secure_distance_end() -> f32 {
    0.20
}
fn default_max_mismatch() -> f32 {
    0.15
}
fn default_max_timebased_dist() -> f32 {
    2.0
}

impl Default for NavCoreConfig {
    fn default() -> Self {
        Self {
            dist_to_target_for_sending_event: 0.0,
            alarm_seems_not_approaching_target_timeout: default_alarm_timeout(),
        }
    }
}

impl Default for WaypointConfig {
    fn default() -> Self {
        Self {
            max_distance_to_allow_skip_waypoint: default_max_skip_distance(),
            min_timesteps_confirm_skip_waypoints: default_min_timesteps_confirm_skip(),
        }
    }
}

impl NavigatorConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("failed to read config file: {}", e)))?;
        let config: NavigatorConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration for the given strategy names with all other
    /// parameters at their defaults.
    pub fn with_strategies(holonomic: &str, decider: &str) -> Self {
        Self {
            navigator: NavCoreConfig::default(),
            waypoints: WaypointConfig::default(),
            reactive: ReactiveConfig {
                holonomic_method: holonomic.to_string(),
                motion_decider_method: decider.to_string(),
                speedfilter_tau: 0.0,
                secure_distance_start: default_secure_distance_start(),
                secure_distance_end: default_secure_distance_end(),
                use_delays_model: false,
                max_distance_predicted_actual_path: default_max_mismatch(),
                max_dist_for_timebased_path_prediction: default_max_timebased_dist(),
                evaluate_clearance: false,
                robot_absolute_speed_limits: SpeedLimits::default(),
                holonomic_params: toml::value::Table::new(),
                decider_params: toml::value::Table::new(),
            },
        }
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        let r = &self.reactive;
        if r.secure_distance_end <= r.secure_distance_start {
            return Err(NavError::Config(format!(
                "secure_distance_end ({}) must be greater than secure_distance_start ({})",
                r.secure_distance_end, r.secure_distance_start
            )));
        }
        if r.holonomic_method.is_empty() || r.motion_decider_method.is_empty() {
            return Err(NavError::Config(
                "holonomic_method and motion_decider_method must be set".to_string(),
            ));
        }
        Ok(())
    }
}
