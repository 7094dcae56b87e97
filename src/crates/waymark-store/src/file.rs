//! JSON-file storage backends.
//!
//! The waypoint store appends one JSON line per record, so a crashed write
//! can at worst lose the line being written, never corrupt earlier records.
//! The preference store keeps the whole map in one JSON file and replaces it
//! atomically through a temp-file rename.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::record::WaypointRecord;
use crate::traits::{PreferenceStore, WaypointStore};

/// Append-only JSON-lines waypoint store.
pub struct JsonFileWaypointStore {
    path: PathBuf,
}

impl JsonFileWaypointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read every record back, skipping nothing: a malformed line is an
    /// error, not a silent gap.
    pub async fn read_all(&self) -> Result<Vec<WaypointRecord>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl WaypointStore for JsonFileWaypointStore {
    async fn write_waypoint(&self, record: &WaypointRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        debug!(record = %record.id, path = %self.path.display(), "waypoint appended");
        Ok(())
    }
}

/// JSON map preference store with atomic replace-on-write.
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    cache: RwLock<HashMap<String, Value>>,
}

impl JsonFilePreferenceStore {
    /// Open the store, loading the existing map if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    async fn persist(&self, snapshot: &HashMap<String, Value>) -> Result<()> {
        let raw = serde_json::to_vec_pretty(snapshot)?;
        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[async_trait]
impl PreferenceStore for JsonFilePreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.cache.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let snapshot = {
            let mut cache = self.cache.write();
            cache.insert(key.to_string(), value);
            cache.clone()
        };
        self.persist(&snapshot).await?;
        debug!(key, path = %self.path.display(), "preference persisted");
        Ok(())
    }
}
