//! In-memory storage backends for development and testing.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::record::WaypointRecord;
use crate::traits::{PreferenceStore, WaypointStore};

/// Thread-safe in-memory waypoint store.
///
/// Append-only, like every conforming backend: there is no update or delete
/// path. `records()` and `clear()` exist for test assertions and isolation.
#[derive(Clone, Default)]
pub struct MemoryWaypointStore {
    records: Arc<RwLock<Vec<WaypointRecord>>>,
}

impl MemoryWaypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn records(&self) -> Vec<WaypointRecord> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }
}

#[async_trait]
impl WaypointStore for MemoryWaypointStore {
    async fn write_waypoint(&self, record: &WaypointRecord) -> Result<()> {
        debug!(record = %record.id, "writing waypoint to memory store");
        self.records.write().push(record.clone());
        Ok(())
    }
}

/// Thread-safe in-memory preference store.
#[derive(Clone, Default)]
pub struct MemoryPreferenceStore {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.values.write().clear();
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        debug!(key, "writing preference to memory store");
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }
}
