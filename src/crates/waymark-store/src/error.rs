//! Storage error types.

use thiserror::Error;

/// Convenience result type using [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from the persistence collaborators.
///
/// A failed waypoint write surfaces to the user as a save failure with the
/// held fix preserved; it is never retried automatically.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file or device I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record or preference value could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure
    #[error("storage failure: {0}")]
    Backend(String),
}
