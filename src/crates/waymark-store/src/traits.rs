//! Storage trait seams.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::record::WaypointRecord;

/// Write-side seam for captured waypoints.
///
/// `write_waypoint` is treated as a single atomic call by the workflows: it
/// either persists the whole record or fails, and a failure is surfaced to
/// the user rather than retried automatically.
#[async_trait]
pub trait WaypointStore: Send + Sync {
    async fn write_waypoint(&self, record: &WaypointRecord) -> Result<()>;
}

/// Key/value seam for settings.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Convenience accessor for boolean settings; absent or non-boolean
    /// values read as false.
    async fn get_bool(&self, key: &str) -> Result<bool> {
        Ok(self
            .get(key)
            .await?
            .and_then(|value| value.as_bool())
            .unwrap_or(false))
    }
}
