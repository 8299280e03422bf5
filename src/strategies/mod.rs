//! Plug-in strategy contracts and their name-keyed registry.
//!
//! The holonomic method and the motion optimizer are swappable behaviors;
//! the configuration names one implementation per slot and the registry
//! resolves those names at navigator construction time.

mod holonomic;
mod optimizer;

pub use holonomic::{HolonomicInput, HolonomicMethod, HolonomicOutput};
pub use optimizer::{Decision, MotionOptimizer};

use crate::error::{NavError, Result};
use std::collections::HashMap;

type HolonomicFactory = Box<dyn Fn() -> Box<dyn HolonomicMethod> + Send>;
type OptimizerFactory = Box<dyn Fn() -> Box<dyn MotionOptimizer> + Send>;

/// Name-keyed factories for the pluggable strategy slots.
///
/// Hosts register their implementations before constructing the navigator;
/// a configuration naming an unregistered class fails with
/// [`NavError::UnknownStrategy`].
#[derive(Default)]
pub struct StrategyRegistry {
    holonomic: HashMap<String, HolonomicFactory>,
    optimizers: HashMap<String, OptimizerFactory>,
}

impl StrategyRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a holonomic method under `name`.
    pub fn register_holonomic<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn HolonomicMethod> + Send + 'static,
    {
        self.holonomic.insert(name.to_string(), Box::new(factory));
    }

    /// Register a motion optimizer under `name`.
    pub fn register_optimizer<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn MotionOptimizer> + Send + 'static,
    {
        self.optimizers.insert(name.to_string(), Box::new(factory));
    }

    /// Instantiate the holonomic method registered under `name`.
    pub fn create_holonomic(&self, name: &str) -> Result<Box<dyn HolonomicMethod>> {
        self.holonomic
            .get(name)
            .map(|f| f())
            .ok_or_else(|| NavError::UnknownStrategy(name.to_string()))
    }

    /// Instantiate the motion optimizer registered under `name`.
    pub fn create_optimizer(&self, name: &str) -> Result<Box<dyn MotionOptimizer>> {
        self.optimizers
            .get(name)
            .map(|f| f())
            .ok_or_else(|| NavError::UnknownStrategy(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::CandidateMovement;

    struct NullHolonomic;
    impl HolonomicMethod for NullHolonomic {
        fn initialize(&mut self, _params: &toml::value::Table) -> Result<()> {
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

    struct NullOptimizer;
    impl MotionOptimizer for NullOptimizer {
        fn configure(&mut self, _params: &toml::value::Table) -> Result<()> {
            Ok(())
        }
        fn decide(&mut self, candidates: &[CandidateMovement]) -> Decision {
            Decision {
                best: candidates.iter().position(|c| c.is_viable()),
                evaluations: vec![0.0; candidates.len()],
            }
        }
    }

    #[test]
    fn test_registry_roundtrip() {
        let mut reg = StrategyRegistry::new();
        reg.register_holonomic("null", || Box::new(NullHolonomic));
        reg.register_optimizer("null", || Box::new(NullOptimizer));

        assert!(reg.create_holonomic("null").is_ok());
        let mut decider = reg.create_optimizer("null").unwrap();

        let mut viable = CandidateMovement {
            speed: 0.5,
            ..Default::default()
        };
        viable.props.insert("hysteresis".to_string(), 1.0);
        let mut dead = CandidateMovement::default();
        dead.invalidate();

        let decision = decider.decide(&[dead, viable]);
        assert_eq!(decision.best, Some(1));
        assert_eq!(decision.evaluations.len(), 2);
    }

    #[test]
    fn test_unknown_strategy_fails() {
        let reg = StrategyRegistry::new();
        assert!(matches!(
            reg.create_holonomic("missing"),
            Err(NavError::UnknownStrategy(_))
        ));
        assert!(matches!(
            reg.create_optimizer("missing"),
            Err(NavError::UnknownStrategy(_))
        ));
    }
}
