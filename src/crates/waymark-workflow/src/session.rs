//! The control loop driving a waypoint workflow.
//!
//! The workflow itself is a plain state machine; something has to pump
//! user intents, task events, and permission decisions into it one at a
//! time. That is the session: a single consumer multiplexing the three
//! channels, which is what makes the workflow's thread of control
//! single-threaded and non-blocking regardless of where results were
//! produced.

use tokio::sync::mpsc;
use tracing::debug;

use waymark_core::TaskEvent;

use crate::permission::PermissionDecision;
use crate::waypoint::WaypointWorkflow;

/// A user intent fed in from the UI surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// The view became visible
    Activate,
    /// Pull-to-retry
    Refresh,
    /// Persist the held fix
    Save {
        comment: String,
        attachment: Option<String>,
    },
    /// The view is being torn down; ends the session
    Deactivate,
}

/// Runs a [`WaypointWorkflow`] until the view deactivates or every input
/// channel closes.
pub struct WaypointSession {
    workflow: WaypointWorkflow,
    intents: mpsc::UnboundedReceiver<Intent>,
    tasks: mpsc::UnboundedReceiver<TaskEvent>,
    decisions: mpsc::UnboundedReceiver<PermissionDecision>,
}

impl WaypointSession {
    pub fn new(
        workflow: WaypointWorkflow,
        intents: mpsc::UnboundedReceiver<Intent>,
        tasks: mpsc::UnboundedReceiver<TaskEvent>,
        decisions: mpsc::UnboundedReceiver<PermissionDecision>,
    ) -> Self {
        Self {
            workflow,
            intents,
            tasks,
            decisions,
        }
    }

    /// Drive the workflow to completion. Returns the workflow so the
    /// embedder can snapshot a held fix after teardown.
    pub async fn run(mut self) -> WaypointWorkflow {
        loop {
            tokio::select! {
                Some(intent) = self.intents.recv() => {
                    debug!(?intent, "intent received");
                    match intent {
                        Intent::Activate => self.workflow.activate(),
                        Intent::Refresh => self.workflow.refresh(),
                        Intent::Save { comment, attachment } => {
                            self.workflow.save(&comment, attachment).await;
                        }
                        Intent::Deactivate => {
                            self.workflow.deactivate();
                            break;
                        }
                    }
                }
                Some(event) = self.tasks.recv() => {
                    self.workflow.handle_task_event(event);
                }
                Some(decision) = self.decisions.recv() => {
                    self.workflow.handle_permission(decision);
                }
                else => {
                    self.workflow.deactivate();
                    break;
                }
            }
        }
        self.workflow
    }
}
