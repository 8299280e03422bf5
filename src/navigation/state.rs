//! Navigator lifecycle state.

use serde::{Deserialize, Serialize};

/// State of the navigator lifecycle machine.
///
/// ```text
/// Idle       -> Navigating  on navigate() / navigate_waypoints()
/// Navigating -> Idle        on arrival or cancel()
/// Navigating -> NavError    on stall timeout or robot failures
/// Navigating -> Suspended   on suspend()
/// Suspended  -> Navigating  on resume()
/// NavError   -> Idle        on reset_error()
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NavState {
    /// No active navigation.
    #[default]
    Idle,

    /// Actively driving toward a target.
    Navigating,

    /// Navigation paused; the target is retained.
    Suspended,

    /// Navigation aborted by an error; cleared via `reset_error()`.
    NavError,
}

impl NavState {
    /// String form for logs and published status.
    pub fn as_str(&self) -> &'static str {
        match self {
            NavState::Idle => "IDLE",
            NavState::Navigating => "NAVIGATING",
            NavState::Suspended => "SUSPENDED",
            NavState::NavError => "NAV_ERROR",
        }
    }
}
