//! The reactive decision layer: delay model, candidate bookkeeping,
//! per-tick pipeline and candidate scoring.

pub(crate) mod candidate;
mod delays;
mod pipeline;
mod record;
pub(crate) mod scoring;

pub use candidate::{CandidateMovement, PtgTickInfo, SentVelCmd, INVALID_SPEED};
pub use delays::{DelayModel, DelayOffsets, LowPassFilter};
pub use record::NavLogRecord;
