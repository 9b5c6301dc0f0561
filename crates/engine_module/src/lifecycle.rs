//! Module lifecycle phases.
//!
//! The phase only moves forward. Reaching [`Phase::Ready`] is the release
//! point after which systems may run on any host thread; invocation checks
//! it with acquire ordering so no system sees a half-filled callback table.

use std::sync::atomic::{AtomicU8, Ordering};

use tracing::info;

/// Where the host is in the startup handshake.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Uninitialized = 0,
    VersionChecked = 1,
    IdentifiersRegistering = 2,
    CatalogBuilt = 3,
    CallbacksRegistering = 4,
    Ready = 5,
}

impl Phase {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::VersionChecked,
            2 => Self::IdentifiersRegistering,
            3 => Self::CatalogBuilt,
            4 => Self::CallbacksRegistering,
            _ => Self::Ready,
        }
    }
}

/// Monotonic, thread-safe phase tracker.
#[derive(Debug, Default)]
pub struct Lifecycle {
    phase: AtomicU8,
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        Phase::from_raw(self.phase.load(Ordering::Acquire))
    }

    /// Move to `to` unless the lifecycle is already there or beyond.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn advance(&self, to: Phase) -> bool {
        let previous = self.phase.fetch_max(to as u8, Ordering::AcqRel);
        let moved = previous < to as u8;
        if moved {
            info!(from = ?Phase::from_raw(previous), to = ?to, "module phase changed");
        }
        moved
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase() == Phase::Ready
    }
}
