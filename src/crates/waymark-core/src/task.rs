//! The cancellable one-shot acquisition task.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::failure::FailureReason;
use crate::fix::Fix;
use crate::permission::{Capability, PermissionGate};
use crate::provider::LocationProvider;

/// Unique identifier of one acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of an acquisition task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Created but not yet started
    Idle,
    /// Fetch in progress
    Running,
    /// Finished with a fix
    Completed,
    /// Finished with a failure reason
    Failed,
    /// Cancelled before a result was delivered
    Cancelled,
}

impl TaskStatus {
    /// Completed, Failed, and Cancelled are terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Idle => write!(f, "Idle"),
            TaskStatus::Running => write!(f, "Running"),
            TaskStatus::Completed => write!(f, "Completed"),
            TaskStatus::Failed => write!(f, "Failed"),
            TaskStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Shared view of one running or terminated acquisition.
///
/// Clones share the same status cell, so a handle held by a workflow and the
/// copy held by the runner always agree. Status only ever moves from
/// `Running` to exactly one terminal state.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    status: Arc<Mutex<TaskStatus>>,
}

impl TaskHandle {
    pub(crate) fn new_running() -> Self {
        Self {
            id: TaskId::new(),
            status: Arc::new(Mutex::new(TaskStatus::Running)),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn status(&self) -> TaskStatus {
        *self.status.lock()
    }

    pub fn is_running(&self) -> bool {
        self.status() == TaskStatus::Running
    }

    /// Mark the task cancelled. Idempotent; a no-op once terminal.
    pub fn cancel(&self) {
        let mut status = self.status.lock();
        if *status == TaskStatus::Running {
            *status = TaskStatus::Cancelled;
        }
    }

    /// Transition `Running` to the given terminal state. Returns false when
    /// the task already reached a terminal state, which is how a natural
    /// completion racing a cancel loses.
    pub(crate) fn finish(&self, terminal: TaskStatus) -> bool {
        debug_assert!(terminal.is_terminal());
        let mut status = self.status.lock();
        if *status == TaskStatus::Running {
            *status = terminal;
            true
        } else {
            false
        }
    }
}

/// Result of one acquisition attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The provider produced a fix within the deadline
    Completed(Fix),
    /// The attempt failed; the reason set is never empty
    Failed(FailureReason),
}

/// Run one acquisition attempt to completion.
///
/// Preconditions are checked before the provider is touched: a missing
/// capability or a disabled provider fails immediately, and both facts are
/// reported together when both hold. The fetch itself is bounded by
/// `deadline`; expiry is reported as a disabled provider, the same as any
/// other provider-side failure.
pub(crate) async fn acquire_once(
    provider: &dyn LocationProvider,
    gate: &dyn PermissionGate,
    capability: Capability,
    deadline: Duration,
) -> TaskOutcome {
    let mut reason = FailureReason::empty();
    if !gate.is_granted(capability) {
        reason |= FailureReason::PERMISSION_MISSING;
    }
    if !provider.is_enabled() {
        reason |= FailureReason::PROVIDER_DISABLED;
    }
    if !reason.is_empty() {
        debug!(%reason, "acquisition preconditions not met");
        return TaskOutcome::Failed(reason);
    }

    match tokio::time::timeout(deadline, provider.request_single_fix(deadline)).await {
        Ok(Ok(fix)) => {
            debug!(
                latitude = fix.latitude,
                longitude = fix.longitude,
                accuracy_m = fix.accuracy_m,
                provider = %fix.provider,
                "fix acquired"
            );
            TaskOutcome::Completed(fix)
        }
        Ok(Err(err)) => {
            warn!(error = %err, "provider failed to produce a fix");
            TaskOutcome::Failed(FailureReason::PROVIDER_DISABLED)
        }
        Err(_) => {
            warn!(deadline_secs = deadline.as_secs(), "fetch deadline expired");
            TaskOutcome::Failed(FailureReason::PROVIDER_DISABLED)
        }
    }
}
