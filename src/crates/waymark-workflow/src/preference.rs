//! Capability-gated preference toggles.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use waymark_core::{Capability, PermissionGate};
use waymark_store::PreferenceStore;

use crate::permission::{decision_callbacks, PermissionCoordinator, PermissionDecision, RequestToken};
use crate::surface::SurfaceEvent;
use crate::Result;

const TOKEN_NAMESPACE: &str = "settings";

/// Gates a boolean setting behind a capability grant.
///
/// Turning a gated setting on commits only after the capability is held:
/// immediately when it already is, otherwise after the prompt resolves with
/// a grant. On denial nothing is written and the toggle stays visually
/// unchanged. The second, independent user of the [`PermissionCoordinator`]
/// besides the waypoint workflow - its tokens live in their own namespace.
pub struct PreferenceGateWorkflow {
    gate: Arc<dyn PermissionGate>,
    coordinator: Arc<PermissionCoordinator>,
    preferences: Arc<dyn PreferenceStore>,
    surface: mpsc::UnboundedSender<SurfaceEvent>,
    decisions: mpsc::UnboundedSender<PermissionDecision>,
}

impl PreferenceGateWorkflow {
    pub fn new(
        gate: Arc<dyn PermissionGate>,
        coordinator: Arc<PermissionCoordinator>,
        preferences: Arc<dyn PreferenceStore>,
        surface: mpsc::UnboundedSender<SurfaceEvent>,
        decisions: mpsc::UnboundedSender<PermissionDecision>,
    ) -> Self {
        Self {
            gate,
            coordinator,
            preferences,
            surface,
            decisions,
        }
    }

    /// Attempt to switch a gated setting on.
    pub async fn toggle_on(&mut self, key: &str, capability: Capability) -> Result<()> {
        if self.gate.is_granted(capability) {
            return self.commit(key).await;
        }
        debug!(key, %capability, "capability not held, prompting before commit");
        let (on_granted, on_denied) = decision_callbacks(self.decisions.clone());
        self.coordinator
            .request(Self::token_for(key), capability, on_granted, on_denied)?;
        Ok(())
    }

    /// Switch a setting off. Dropping a capability-backed behavior needs no
    /// grant, so this commits directly.
    pub async fn toggle_off(&mut self, key: &str) -> Result<()> {
        self.preferences.set(key, Value::Bool(false)).await?;
        self.emit(SurfaceEvent::PreferenceShown {
            key: key.to_string(),
            enabled: false,
        });
        Ok(())
    }

    /// Feed a permission decision from the control channel. Decisions for
    /// tokens outside the settings namespace are ignored.
    pub async fn handle_permission(&mut self, decision: PermissionDecision) -> Result<()> {
        let Some(key) = Self::key_for(&decision.token) else {
            return Ok(());
        };
        if decision.granted {
            let key = key.to_string();
            self.commit(&key).await?;
        } else {
            info!(key, "capability denied, preference left untouched");
        }
        Ok(())
    }

    fn token_for(key: &str) -> RequestToken {
        RequestToken::namespaced(TOKEN_NAMESPACE, key)
    }

    fn key_for(token: &RequestToken) -> Option<&str> {
        token
            .as_str()
            .strip_prefix(TOKEN_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('/'))
    }

    async fn commit(&self, key: &str) -> Result<()> {
        self.preferences.set(key, Value::Bool(true)).await?;
        info!(key, "gated preference committed");
        self.emit(SurfaceEvent::PreferenceShown {
            key: key.to_string(),
            enabled: true,
        });
        Ok(())
    }

    fn emit(&self, event: SurfaceEvent) {
        if self.surface.send(event).is_err() {
            debug!("surface channel closed, event dropped");
        }
    }
}
