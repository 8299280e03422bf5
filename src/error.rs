//! Error types for DishaNav.

use thiserror::Error;

/// DishaNav error type.
///
/// Only unrecoverable failures are represented here. Per-candidate
/// conditions (target out of PTG domain, NOP mismatch, non-bijective
/// ambiguity) never become errors: they invalidate the candidate so the
/// motion optimizer discards it.
#[derive(Error, Debug)]
pub enum NavError {
    /// The robot interface failed to report pose and velocities.
    #[error("failed to read robot pose and speeds")]
    PoseReadFailure,

    /// The robot interface rejected a velocity command.
    #[error("failed to send velocity command to robot")]
    CommandSendFailure,

    /// The obstacle sensing hook failed.
    #[error("obstacle sensing failed: {0}")]
    SenseFailure(String),

    /// Configuration error (bad file, missing required key, bad value).
    #[error("configuration error: {0}")]
    Config(String),

    /// A strategy name from the configuration is not registered.
    #[error("unknown strategy class: {0}")]
    UnknownStrategy(String),

    /// Navigation was requested before `initialize()`.
    #[error("navigator is not initialized")]
    NotInitialized,
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

impl From<std::io::Error> for NavError {
    fn from(e: std::io::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
