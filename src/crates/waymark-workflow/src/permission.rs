//! Permission request routing.
//!
//! An OS permission prompt resolves at an arbitrary later time, on an
//! arbitrary thread, with no positional relationship to the call that
//! issued it. The coordinator therefore correlates request and result
//! through an explicit token table: the caller supplies an opaque token
//! saying *why* it asked, and the result is routed back to exactly that
//! caller's handler, exactly once. A result for a token nobody is waiting
//! on - the caller was torn down and recreated in the meantime - is a safe
//! no-op.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use waymark_core::{Capability, PermissionGate};

use crate::{Result, WorkflowError};

/// Caller-supplied opaque token identifying the purpose of a permission
/// request. Tokens are namespaced per call site so independent callers
/// never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestToken(String);

impl RequestToken {
    pub fn namespaced(namespace: &str, purpose: &str) -> Self {
        Self(format!("{namespace}/{purpose}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The outcome of one permission request, as posted to the caller's
/// control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDecision {
    pub token: RequestToken,
    pub granted: bool,
}

/// Handler invoked with the token when a request resolves one way.
pub type DecisionCallback = Box<dyn FnOnce(RequestToken) + Send>;

/// Build a grant/deny callback pair that posts a [`PermissionDecision`]
/// onto the given control channel. This is how workflows get results back
/// on their own control thread.
pub fn decision_callbacks(
    decisions: mpsc::UnboundedSender<PermissionDecision>,
) -> (DecisionCallback, DecisionCallback) {
    let granted_tx = decisions.clone();
    let on_granted: DecisionCallback = Box::new(move |token| {
        let _ = granted_tx.send(PermissionDecision {
            token,
            granted: true,
        });
    });
    let on_denied: DecisionCallback = Box::new(move |token| {
        let _ = decisions.send(PermissionDecision {
            token,
            granted: false,
        });
    });
    (on_granted, on_denied)
}

struct PendingRequest {
    capability: Capability,
    on_granted: DecisionCallback,
    on_denied: DecisionCallback,
}

/// Correlates in-flight permission prompts with their call sites.
///
/// The token table is the only structure touched from both the request
/// path and the asynchronous resolution path; one mutex guards the
/// lookup-and-clear so a request and its resolution can never interleave
/// on the same token.
pub struct PermissionCoordinator {
    gate: Arc<dyn PermissionGate>,
    pending: Arc<Mutex<HashMap<RequestToken, PendingRequest>>>,
}

impl PermissionCoordinator {
    pub fn new(gate: Arc<dyn PermissionGate>) -> Self {
        Self {
            gate,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Issue a permission request for `token`.
    ///
    /// Short-circuits straight to `on_granted` when the capability is
    /// already held. Otherwise the token is recorded and the OS prompt is
    /// issued in the background; the eventual answer flows through
    /// [`resolve`](Self::resolve). A token that is already pending is
    /// rejected - replacing the first caller's handlers silently would
    /// lose them.
    pub fn request(
        &self,
        token: RequestToken,
        capability: Capability,
        on_granted: DecisionCallback,
        on_denied: DecisionCallback,
    ) -> Result<()> {
        if self.gate.is_granted(capability) {
            debug!(%token, %capability, "capability already held, short-circuiting");
            on_granted(token);
            return Ok(());
        }

        {
            let mut pending = self.pending.lock();
            if pending.contains_key(&token) {
                warn!(%token, "duplicate permission request rejected");
                return Err(WorkflowError::RequestPending(token));
            }
            pending.insert(
                token.clone(),
                PendingRequest {
                    capability,
                    on_granted,
                    on_denied,
                },
            );
        }

        debug!(%token, %capability, "issuing permission prompt");
        let gate = Arc::clone(&self.gate);
        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            let granted = gate.prompt_for(capability).await;
            resolve_pending(&pending, &token, granted);
        });
        Ok(())
    }

    /// Deliver the result for `token`, invoking exactly one of the
    /// caller's handlers and forgetting the request.
    ///
    /// An unknown token is ignored: the caller may have been destroyed and
    /// recreated while the prompt was up, and a late result must neither
    /// crash nor resurrect stale state.
    pub fn resolve(&self, token: &RequestToken, granted: bool) {
        resolve_pending(&self.pending, token, granted);
    }

    /// Whether a request is outstanding for `token`.
    pub fn is_pending(&self, token: &RequestToken) -> bool {
        self.pending.lock().contains_key(token)
    }
}

fn resolve_pending(
    pending: &Mutex<HashMap<RequestToken, PendingRequest>>,
    token: &RequestToken,
    granted: bool,
) {
    let removed = pending.lock().remove(token);
    match removed {
        Some(request) => {
            debug!(%token, granted, capability = %request.capability, "permission request resolved");
            if granted {
                (request.on_granted)(token.clone());
            } else {
                (request.on_denied)(token.clone());
            }
        }
        None => {
            debug!(%token, "resolution for unknown token ignored");
        }
    }
}
