//! The persisted waypoint record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waymark_core::Fix;

/// One captured waypoint: a fix, the user's comment, and an optional
/// attachment reference.
///
/// Records are written once and never mutated. The attachment reference is
/// carried opaquely; resolving it is someone else's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointRecord {
    /// Unique record identifier
    pub id: Uuid,
    /// The position this waypoint marks
    pub fix: Fix,
    /// Free-text comment entered by the user
    pub comment: String,
    /// Opaque reference to an attached artifact, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl WaypointRecord {
    pub fn new(fix: Fix, comment: impl Into<String>, attachment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            fix,
            comment: comment.into(),
            attachment,
            created_at: Utc::now(),
        }
    }
}
