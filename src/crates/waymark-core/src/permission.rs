//! Capability grants and the permission subsystem seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An OS-mediated permission grant that can be independently granted or
/// denied at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Precise foreground location access
    FineLocation,
    /// Location access while not in the foreground
    BackgroundLocation,
    /// Writing attachments to shared storage
    StorageWrite,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::FineLocation => "fine_location",
            Capability::BackgroundLocation => "background_location",
            Capability::StorageWrite => "storage_write",
        };
        write!(f, "{name}")
    }
}

/// Seam toward the OS permission subsystem.
///
/// `is_granted` answers synchronously from current state; `prompt_for`
/// surfaces the modal OS prompt and resolves with the user's decision. The
/// prompt can take arbitrarily long and may outlive the view that asked for
/// it, which is why results are routed back through a token table (see the
/// coordinator in `waymark-workflow`) rather than assumed to return to the
/// original call site.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Whether the capability is currently held.
    fn is_granted(&self, capability: Capability) -> bool;

    /// Prompt the user for the capability; resolves true on grant.
    async fn prompt_for(&self, capability: Capability) -> bool;
}
