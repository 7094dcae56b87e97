//! Events emitted toward the UI surface.
//!
//! The workflows never render anything; they describe what the surface
//! should show and let the embedding UI interpret it. Notices are transient
//! by contract - the only modal interaction in the system is the OS
//! permission prompt itself.

use waymark_core::Fix;

/// A transient, user-visible message.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The location permission is missing or was refused
    PermissionDenied,
    /// The location provider is switched off or produced nothing
    LocationDisabled,
    /// Persisting the waypoint failed; the fix is still held
    SaveFailed(String),
}

/// A state transition the UI surface should reflect.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Show or hide the refresh spinner
    Refreshing(bool),
    /// A fix was acquired; `position` and `details` are preformatted for
    /// display
    FixShown {
        fix: Fix,
        position: String,
        details: String,
    },
    /// Clear any displayed position (a new acquisition is starting)
    FixCleared,
    /// Show the "location not found" indicator
    FixUnavailable,
    /// Enable or disable the save action
    SaveEnabled(bool),
    /// Surface a transient notice
    Notice(Notice),
    /// The workflow is done; the view should close
    CloseRequested,
    /// A gated preference toggle should now read as on/off
    PreferenceShown { key: String, enabled: bool },
}
