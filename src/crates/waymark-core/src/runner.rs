//! Owner-scoped task scheduling with stale-event filtering.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::AcquisitionConfig;
use crate::permission::{Capability, PermissionGate};
use crate::provider::LocationProvider;
use crate::task::{acquire_once, TaskHandle, TaskId, TaskOutcome, TaskStatus};

/// The capability every acquisition needs before the provider is touched.
const REQUIRED_CAPABILITY: Capability = Capability::FineLocation;

/// Identifies the workflow instance a task belongs to.
///
/// The "at most one running task" invariant is bounded per owner, and events
/// are routed back to their owner through this id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A finished acquisition, posted onto the owner's control channel.
///
/// An event is a *claim* that a task finished; it becomes a delivery only
/// once [`TaskRunner::admit`] confirms it is still current.
#[derive(Debug)]
pub struct TaskEvent {
    pub owner: OwnerId,
    pub task: TaskId,
    pub outcome: TaskOutcome,
}

struct ActiveTask {
    handle: TaskHandle,
    join: JoinHandle<()>,
}

/// Schedules at most one acquisition task per owner and filters stale
/// results at the delivery boundary.
///
/// Background tasks post [`TaskEvent`]s onto the channel given at
/// construction; the owner's control loop feeds each event back through
/// [`admit`](Self::admit). Admission checks the event against the
/// currently-live handle *by identity*, not by a cancelled flag, which
/// closes the race where a cancel and a natural completion happen
/// concurrently: whichever claims the handle's single `Running` to terminal
/// transition first wins, and the loser is dropped silently.
pub struct TaskRunner {
    provider: Arc<dyn LocationProvider>,
    gate: Arc<dyn PermissionGate>,
    config: AcquisitionConfig,
    events: mpsc::UnboundedSender<TaskEvent>,
    active: DashMap<OwnerId, ActiveTask>,
}

impl TaskRunner {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        gate: Arc<dyn PermissionGate>,
        config: AcquisitionConfig,
        events: mpsc::UnboundedSender<TaskEvent>,
    ) -> Self {
        Self {
            provider,
            gate,
            config,
            events,
            active: DashMap::new(),
        }
    }

    /// Start an acquisition for `owner`, or return the live handle if one is
    /// already running.
    pub fn run(&self, owner: &OwnerId) -> TaskHandle {
        match self.active.entry(owner.clone()) {
            Entry::Occupied(mut slot) => {
                if slot.get().handle.is_running() {
                    debug!(owner = %owner, task = %slot.get().handle.id(), "task already running");
                    return slot.get().handle.clone();
                }
                let active = self.spawn(owner.clone());
                let handle = active.handle.clone();
                slot.insert(active);
                handle
            }
            Entry::Vacant(slot) => {
                let active = self.spawn(owner.clone());
                let handle = active.handle.clone();
                slot.insert(active);
                handle
            }
        }
    }

    /// Cancel the owner's task, if any, and clear the slot so a subsequent
    /// [`run`](Self::run) starts fresh.
    pub fn stop(&self, owner: &OwnerId) {
        if let Some((_, active)) = self.active.remove(owner) {
            if active.handle.is_running() {
                debug!(owner = %owner, task = %active.handle.id(), "cancelling acquisition task");
                active.handle.cancel();
                active.join.abort();
            }
        }
    }

    /// Whether the owner currently has a running task.
    pub fn is_running(&self, owner: &OwnerId) -> bool {
        self.active
            .get(owner)
            .map(|active| active.handle.is_running())
            .unwrap_or(false)
    }

    /// Confirm an event against the owner's live handle.
    ///
    /// Returns the outcome when the event belongs to the current running
    /// task; the task transitions to its terminal state and the owner's slot
    /// is cleared. Anything else is a stale callback from a cancelled or
    /// superseded task and is dropped here, never surfaced.
    pub fn admit(&self, event: TaskEvent) -> Option<TaskOutcome> {
        let removed = self.active.remove_if(&event.owner, |_, active| {
            active.handle.id() == event.task && active.handle.is_running()
        });
        let Some((_, active)) = removed else {
            debug!(owner = %event.owner, task = %event.task, "stale task event dropped");
            return None;
        };

        let terminal = match &event.outcome {
            TaskOutcome::Completed(_) => TaskStatus::Completed,
            TaskOutcome::Failed(_) => TaskStatus::Failed,
        };
        if !active.handle.finish(terminal) {
            // Cancelled between the remove_if check and here.
            debug!(owner = %event.owner, task = %event.task, "task event lost the cancel race");
            return None;
        }
        debug!(owner = %event.owner, task = %event.task, status = %terminal, "task event admitted");
        Some(event.outcome)
    }

    fn spawn(&self, owner: OwnerId) -> ActiveTask {
        let handle = TaskHandle::new_running();
        let id = handle.id();
        let provider = Arc::clone(&self.provider);
        let gate = Arc::clone(&self.gate);
        let deadline = self.config.fetch_timeout();
        let events = self.events.clone();
        let task_handle = handle.clone();

        debug!(owner = %owner, task = %id, deadline_secs = deadline.as_secs(), "starting acquisition");
        let join = tokio::spawn(async move {
            let outcome =
                acquire_once(provider.as_ref(), gate.as_ref(), REQUIRED_CAPABILITY, deadline).await;
            // Best-effort early exit; admit() remains the authoritative filter.
            if !task_handle.is_running() {
                debug!(owner = %owner, task = %id, "task no longer current, result discarded");
                return;
            }
            let event = TaskEvent {
                owner: owner.clone(),
                task: id,
                outcome,
            };
            if events.send(event).is_err() {
                warn!(owner = %owner, "control channel closed, acquisition result discarded");
            }
        });

        ActiveTask { handle, join }
    }
}
