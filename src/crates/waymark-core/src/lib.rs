//! Core acquisition engine for waymark
//!
//! This crate provides the concurrency core of the waypoint capture system:
//! a cancellable one-shot background task that acquires a single position fix
//! from a location provider, and a runner that enforces the "at most one
//! running task per owner" invariant while routing results back onto the
//! owner's control thread.
//!
//! # Overview
//!
//! - [`Fix`] - an immutable resolved position with accuracy and time metadata
//! - [`FailureReason`] - a bit-set of independently-true failure facts
//! - [`LocationProvider`] / [`PermissionGate`] - seams toward the external
//!   location service and the OS permission subsystem
//! - [`TaskHandle`] - identifies one running or terminated acquisition
//! - [`TaskRunner`] - owner-scoped scheduling, cancellation, and stale-event
//!   filtering
//!
//! # Delivery model
//!
//! Background tasks never touch the UI or the workflow directly. A finished
//! acquisition posts a [`TaskEvent`] onto an unbounded channel; the owner's
//! control loop hands each event back to [`TaskRunner::admit`], which checks
//! the event against the currently-live handle and silently drops anything
//! stale. Cancellation therefore takes effect at the delivery boundary, not
//! at the call boundary: a provider response already in flight when the task
//! is cancelled is discarded, never delivered.
//!
//! ```rust,ignore
//! let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
//! let runner = TaskRunner::new(provider, gate, AcquisitionConfig::default(), events_tx);
//!
//! let owner = OwnerId::new("waypoint-screen");
//! runner.run(&owner);
//!
//! while let Some(event) = events_rx.recv().await {
//!     if let Some(outcome) = runner.admit(event) {
//!         // completed or failed, and still current
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod failure;
pub mod fix;
pub mod format;
pub mod permission;
pub mod provider;
pub mod runner;
pub mod task;

pub use config::AcquisitionConfig;
pub use error::{CoreError, Result};
pub use failure::FailureReason;
pub use fix::Fix;
pub use permission::{Capability, PermissionGate};
pub use provider::{LocationProvider, ProviderError};
pub use runner::{OwnerId, TaskEvent, TaskRunner};
pub use task::{TaskHandle, TaskId, TaskOutcome, TaskStatus};
