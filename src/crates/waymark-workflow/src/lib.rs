//! Workflow layer for waymark
//!
//! Orchestrates the capture of a single waypoint on top of the acquisition
//! engine in `waymark-core`, and routes OS permission prompts back to the
//! call site that triggered them.
//!
//! # Pieces
//!
//! - [`PermissionCoordinator`] - correlates an in-flight permission prompt
//!   with a caller-supplied token and invokes the right caller's handler
//!   exactly once on the result
//! - [`WaypointWorkflow`] - the capture state machine: acquire on
//!   activation, retry once through the coordinator on a missing
//!   permission, enable save on success, persist on demand
//! - [`PreferenceGateWorkflow`] - gates a boolean setting behind a
//!   capability grant before committing it to preference storage
//! - [`WaypointSession`] - the control loop that multiplexes user intents,
//!   task events, and permission decisions onto the workflow, one message
//!   at a time
//!
//! The workflows never block and never touch the UI directly; they emit
//! [`SurfaceEvent`]s over a channel and receive user intents as method
//! calls (or as [`Intent`] messages through the session).

pub mod permission;
pub mod preference;
pub mod session;
pub mod surface;
pub mod waypoint;

use thiserror::Error;

use permission::RequestToken;

/// Errors from the workflow layer.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A second permission request was issued for a token that is still
    /// awaiting its result
    #[error("a permission request is already pending for token '{0}'")]
    RequestPending(RequestToken),

    /// A persistence collaborator failed
    #[error(transparent)]
    Store(#[from] waymark_store::StoreError),
}

/// Convenience result type using [`WorkflowError`].
pub type Result<T> = std::result::Result<T, WorkflowError>;

pub use permission::{PermissionCoordinator, PermissionDecision};
pub use preference::PreferenceGateWorkflow;
pub use session::{Intent, WaypointSession};
pub use surface::{Notice, SurfaceEvent};
pub use waypoint::{WaypointState, WaypointWorkflow, WorkflowSnapshot};
