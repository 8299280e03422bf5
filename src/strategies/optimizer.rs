//! Multi-objective motion optimizer contract.

use crate::error::Result;
use crate::reactive::CandidateMovement;

/// Outcome of one optimizer decision.
#[derive(Debug, Clone, Default)]
pub struct Decision {
    /// Index of the chosen candidate, `None` when no candidate is viable.
    pub best: Option<usize>,
    /// Final evaluation per candidate, parallel to the input slice.
    pub evaluations: Vec<f64>,
}

/// Strategy that ranks candidate motions by their named factors.
///
/// Contract: candidates with `speed < 0` are inviable and must never be
/// chosen. The returned `evaluations` vector has one entry per input
/// candidate (0.0 for discarded ones).
pub trait MotionOptimizer {
    /// Load optimizer parameters from the configuration bag.
    fn configure(&mut self, params: &toml::value::Table) -> Result<()>;

    /// Rank the candidates and pick the best one.
    fn decide(&mut self, candidates: &[CandidateMovement]) -> Decision;
}
