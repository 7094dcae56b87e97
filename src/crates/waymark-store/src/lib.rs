//! Persistence collaborators for waymark
//!
//! Two narrow storage seams sit behind the workflow layer: the waypoint
//! record store (one atomic write per captured waypoint, never mutated
//! afterwards) and the preference store (simple key/value access for
//! settings). Both are async traits so backends can be swapped without
//! touching the workflows.
//!
//! Reference implementations:
//!
//! - [`MemoryWaypointStore`] / [`MemoryPreferenceStore`] - thread-safe
//!   in-memory backends for development and tests
//! - [`JsonFileWaypointStore`] - append-only JSON-lines file
//! - [`JsonFilePreferenceStore`] - JSON map written atomically via a
//!   temp-file rename

pub mod error;
pub mod file;
pub mod memory;
pub mod record;
pub mod traits;

pub use error::{Result, StoreError};
pub use file::{JsonFilePreferenceStore, JsonFileWaypointStore};
pub use memory::{MemoryPreferenceStore, MemoryWaypointStore};
pub use record::WaypointRecord;
pub use traits::{PreferenceStore, WaypointStore};
