//! Location provider seam.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::fix::Fix;

/// Errors a provider can return instead of a fix.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider is switched off at the OS level
    #[error("location provider is disabled")]
    Disabled,

    /// No fix was produced within the requested deadline
    #[error("no fix produced within {0:?}")]
    DeadlineExceeded(Duration),

    /// Any other provider-side failure
    #[error("provider failure: {0}")]
    Other(String),
}

/// Seam toward the external location service.
///
/// The engine depends only on this single-shot contract: one call, one fix
/// or one error, within the given deadline. Continuous tracking is out of
/// scope and deliberately absent from the trait.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Provider name as it should appear in fix metadata (e.g. "gps").
    fn name(&self) -> &str;

    /// Whether the provider is currently usable at all.
    fn is_enabled(&self) -> bool;

    /// Request exactly one fix, waiting at most `deadline`.
    async fn request_single_fix(&self, deadline: Duration) -> Result<Fix, ProviderError>;
}
