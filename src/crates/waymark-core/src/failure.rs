//! Acquisition failure reasons.
//!
//! A failed acquisition can have more than one cause at once: the location
//! permission may be missing *and* the provider may be disabled. Reasons are
//! therefore a small bit-set of independently-true facts rather than a single
//! enum. A `Failed` outcome never carries an empty set.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bit-set of reasons an acquisition attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FailureReason {
    bits: u8,
}

impl FailureReason {
    const PERMISSION_MISSING_BIT: u8 = 1 << 0;
    const PROVIDER_DISABLED_BIT: u8 = 1 << 1;

    /// The location capability is not granted.
    pub const PERMISSION_MISSING: Self = Self {
        bits: Self::PERMISSION_MISSING_BIT,
    };

    /// The provider is disabled, unavailable, or did not produce a fix
    /// within the deadline.
    pub const PROVIDER_DISABLED: Self = Self {
        bits: Self::PROVIDER_DISABLED_BIT,
    };

    /// An empty set. Never valid on a failed outcome.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn permission_missing(&self) -> bool {
        self.bits & Self::PERMISSION_MISSING_BIT != 0
    }

    pub fn provider_disabled(&self) -> bool {
        self.bits & Self::PROVIDER_DISABLED_BIT != 0
    }

    /// True when every fact in `other` is also set in `self`.
    pub fn contains(&self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }
}

impl BitOr for FailureReason {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

impl BitOrAssign for FailureReason {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut first = true;
        let mut put = |f: &mut fmt::Formatter<'_>, name: &str| -> fmt::Result {
            if !first {
                write!(f, "|")?;
            }
            first = false;
            write!(f, "{name}")
        };
        if self.permission_missing() {
            put(f, "permission_missing")?;
        }
        if self.provider_disabled() {
            put(f, "provider_disabled")?;
        }
        Ok(())
    }
}
