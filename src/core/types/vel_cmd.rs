//! Kinematic velocity commands.

use serde::{Deserialize, Serialize};

/// Absolute per-component speed limits applied to every issued command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpeedLimits {
    /// Maximum |linear| velocity (m/s).
    #[serde(default = "default_max_linear")]
    pub max_linear: f32,
    /// Maximum |lateral| velocity (m/s). Zero for non-holonomic robots.
    #[serde(default = "default_max_lateral")]
    pub max_lateral: f32,
    /// Maximum |angular| velocity (rad/s).
    #[serde(default = "default_max_angular")]
    pub max_angular: f32,
}

fn default_max_linear() -> f32 {
    0.3
}
fn default_max_lateral() -> f32 {
    0.0
}
fn default_max_angular() -> f32 {
    1.0
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            max_linear: default_max_linear(),
            max_lateral: default_max_lateral(),
            max_angular: default_max_angular(),
        }
    }
}

/// A velocity command as issued to the robot.
///
/// Three components cover both differential-drive robots (lateral = 0) and
/// fully holonomic platforms. Component-wise access is what the hysteresis
/// scoring and the speed filter operate on.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VelCmd {
    /// Forward velocity (m/s).
    pub linear: f32,
    /// Lateral velocity (m/s), zero on differential drives.
    pub lateral: f32,
    /// Angular velocity (rad/s), CCW positive.
    pub angular: f32,
}

impl VelCmd {
    /// The all-zero stop command.
    pub const STOP: VelCmd = VelCmd {
        linear: 0.0,
        lateral: 0.0,
        angular: 0.0,
    };

    /// Create a new command.
    #[inline]
    pub fn new(linear: f32, lateral: f32, angular: f32) -> Self {
        Self {
            linear,
            lateral,
            angular,
        }
    }

    /// Whether this command stops the robot.
    #[inline]
    pub fn is_stop(&self) -> bool {
        self.linear == 0.0 && self.lateral == 0.0 && self.angular == 0.0
    }

    /// Components as an array, for element-wise comparisons.
    #[inline]
    pub fn components(&self) -> [f32; 3] {
        [self.linear, self.lateral, self.angular]
    }

    /// Scale all components by `factor`.
    #[inline]
    pub fn scale(&mut self, factor: f32) {
        self.linear *= factor;
        self.lateral *= factor;
        self.angular *= factor;
    }

    /// Blend against the previously issued command and clamp to limits.
    ///
    /// First applies the first-order speed filter
    /// `v = beta * v + (1 - beta) * last`, then uniformly scales the whole
    /// command down so every component respects its absolute limit. The
    /// uniform scale preserves the commanded curvature. Returns the extra
    /// scale that was applied (1.0 when already within limits).
    pub fn filter_and_limit(&mut self, last: &VelCmd, beta: f32, limits: &SpeedLimits) -> f32 {
        self.linear = beta * self.linear + (1.0 - beta) * last.linear;
        self.lateral = beta * self.lateral + (1.0 - beta) * last.lateral;
        self.angular = beta * self.angular + (1.0 - beta) * last.angular;

        let mut scale: f32 = 1.0;
        for (v, lim) in self
            .components()
            .iter()
            .zip([limits.max_linear, limits.max_lateral, limits.max_angular])
        {
            if v.abs() > lim {
                if lim <= 0.0 {
                    // Component not supported by this platform: zero it below
                    // via a full stop only if it is the sole motion. Otherwise
                    // clamp it away without scaling the rest.
                    continue;
                }
                scale = scale.min(lim / v.abs());
            }
        }
        self.scale(scale);
        if limits.max_lateral <= 0.0 {
            self.lateral = 0.0;
        }
        scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_stop_detection() {
        assert!(VelCmd::STOP.is_stop());
        assert!(!VelCmd::new(0.1, 0.0, 0.0).is_stop());
    }

    #[test]
    fn test_scale() {
        let mut cmd = VelCmd::new(1.0, 0.0, 0.5);
        cmd.scale(0.5);
        assert_relative_eq!(cmd.linear, 0.5);
        assert_relative_eq!(cmd.angular, 0.25);
    }

    #[test]
    fn test_filter_passthrough_when_beta_one() {
        let mut cmd = VelCmd::new(0.2, 0.0, 0.1);
        let last = VelCmd::new(0.05, 0.0, -0.4);
        let limits = SpeedLimits::default();
        let s = cmd.filter_and_limit(&last, 1.0, &limits);
        assert_relative_eq!(s, 1.0);
        assert_relative_eq!(cmd.linear, 0.2);
        assert_relative_eq!(cmd.angular, 0.1);
    }

    #[test]
    fn test_filter_blends_toward_last() {
        let mut cmd = VelCmd::new(0.2, 0.0, 0.0);
        let last = VelCmd::new(0.0, 0.0, 0.0);
        let limits = SpeedLimits::default();
        cmd.filter_and_limit(&last, 0.25, &limits);
        assert_relative_eq!(cmd.linear, 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_limits_scale_uniformly() {
        let mut cmd = VelCmd::new(0.6, 0.0, 0.5);
        let last = cmd;
        let limits = SpeedLimits {
            max_linear: 0.3,
            max_lateral: 0.0,
            max_angular: 1.0,
        };
        let s = cmd.filter_and_limit(&last, 1.0, &limits);
        assert_relative_eq!(s, 0.5, epsilon = 1e-6);
        assert_relative_eq!(cmd.linear, 0.3, epsilon = 1e-6);
        // Curvature preserved: angular scaled by the same factor.
        assert_relative_eq!(cmd.angular, 0.25, epsilon = 1e-6);
    }
}
