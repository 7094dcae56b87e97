//! Acquisition configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{CoreError, Result};

const ENV_FETCH_TIMEOUT: &str = "WAYMARK_FETCH_TIMEOUT_SECS";
const ENV_PROVIDER: &str = "WAYMARK_PROVIDER";

/// Tunables for a single acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// How long one fetch may take before it is treated as a disabled
    /// provider, in seconds
    pub fetch_timeout_secs: u64,
    /// Preferred provider name
    pub provider: String,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 30,
            provider: "gps".to_string(),
        }
    }
}

impl AcquisitionConfig {
    /// The fetch deadline as a [`Duration`].
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Defaults overridden by `WAYMARK_FETCH_TIMEOUT_SECS` and
    /// `WAYMARK_PROVIDER` when set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(ENV_FETCH_TIMEOUT) {
            config.fetch_timeout_secs = value.parse().map_err(|e| {
                CoreError::Config(format!("invalid {ENV_FETCH_TIMEOUT} '{value}': {e}"))
            })?;
        }
        if let Ok(value) = std::env::var(ENV_PROVIDER) {
            config.provider = value;
        }
        Ok(config)
    }

    /// Load from a JSON file; absent keys fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
