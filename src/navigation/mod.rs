//! Navigation orchestration: lifecycle state machine, waypoint sequencing
//! and the thread-safe API wrapper.

pub(crate) mod navigator;
mod shared;
mod state;
pub(crate) mod target;
mod waypoints;

pub use navigator::ReactiveNavigator;
pub use shared::SharedNavigator;
pub use state::NavState;
pub use target::NavTarget;
pub use waypoints::{Waypoint, WaypointSequence, WaypointStatus, WaypointStatusSequence};
