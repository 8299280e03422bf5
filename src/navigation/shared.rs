//! Thread-safe wrapper around the navigator.

use crate::core::types::Point2D;
use crate::error::Result;
use crate::navigation::navigator::ReactiveNavigator;
use crate::navigation::state::NavState;
use crate::navigation::target::NavTarget;
use crate::navigation::waypoints::{WaypointSequence, WaypointStatusSequence};
use crate::robot::RobotInterface;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::Arc;

/// Synchronised handle to a [`ReactiveNavigator`].
///
/// A single re-entrant lock serialises every public entry point and the
/// tick, so one thread may drive `step()` while others issue control
/// requests. Robot-interface callbacks must not call back into the
/// navigator: the lock is re-entrant but the inner cell is not, and
/// re-entry would panic by contract.
pub struct SharedNavigator<R: RobotInterface> {
    inner: Arc<ReentrantMutex<RefCell<ReactiveNavigator<R>>>>,
}

impl<R: RobotInterface> Clone for SharedNavigator<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RobotInterface> SharedNavigator<R> {
    /// Wrap a navigator.
    pub fn new(navigator: ReactiveNavigator<R>) -> Self {
        Self {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(navigator))),
        }
    }

    /// Compute the PTG collision grids; required before navigation.
    pub fn initialize(&self) {
        let guard = self.inner.lock();
        guard.borrow_mut().initialize();
    }

    /// See [`ReactiveNavigator::navigate`].
    pub fn navigate(&self, target: &NavTarget) -> Result<()> {
        let guard = self.inner.lock();
        let result = guard.borrow_mut().navigate(target);
        result
    }

    /// See [`ReactiveNavigator::navigate_waypoints`].
    pub fn navigate_waypoints(&self, request: &WaypointSequence) -> Result<()> {
        let guard = self.inner.lock();
        let result = guard.borrow_mut().navigate_waypoints(request);
        result
    }

    /// See [`ReactiveNavigator::cancel`].
    pub fn cancel(&self) {
        let guard = self.inner.lock();
        guard.borrow_mut().cancel();
    }

    /// See [`ReactiveNavigator::suspend`].
    pub fn suspend(&self) {
        let guard = self.inner.lock();
        guard.borrow_mut().suspend();
    }

    /// See [`ReactiveNavigator::resume`].
    pub fn resume(&self) {
        let guard = self.inner.lock();
        guard.borrow_mut().resume();
    }

    /// See [`ReactiveNavigator::reset_error`].
    pub fn reset_error(&self) {
        let guard = self.inner.lock();
        guard.borrow_mut().reset_error();
    }

    /// Run one navigation tick.
    pub fn step(&self) {
        let guard = self.inner.lock();
        guard.borrow_mut().step();
    }

    /// Current lifecycle state.
    pub fn current_state(&self) -> NavState {
        let guard = self.inner.lock();
        let state = guard.borrow().current_state();
        state
    }

    /// Current waypoint navigation status.
    pub fn waypoint_status(&self) -> WaypointStatusSequence {
        let guard = self.inner.lock();
        let status = guard.borrow().waypoint_status();
        status
    }

    /// Whether a robot-local point is reachable through any PTG.
    pub fn is_relative_point_reachable(&self, wp_local: &Point2D) -> bool {
        let guard = self.inner.lock();
        let reachable = guard.borrow().is_relative_point_reachable(wp_local);
        reachable
    }

    /// Run a closure with mutable access to the navigator, under the lock.
    pub fn with<T>(&self, f: impl FnOnce(&mut ReactiveNavigator<R>) -> T) -> T {
        let guard = self.inner.lock();
        let result = f(&mut guard.borrow_mut());
        result
    }
}
