//! Error types for the core acquisition engine.

use thiserror::Error;

/// Convenience result type using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors produced outside the acquisition path itself.
///
/// Acquisition failures are not errors in this sense: they travel as
/// [`FailureReason`](crate::FailureReason) facts inside a task outcome, since
/// the workflow reacts to them rather than propagating them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration could not be loaded or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error while reading a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
