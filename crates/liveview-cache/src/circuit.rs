//! Process-wide availability flag for the primary presence store.

use std::sync::atomic::{AtomicBool, Ordering};

/// One-way circuit breaker.
///
/// Starts available and flips to unavailable on the first reported
/// failure. There is no half-open state: only a process restart (a new
/// instance) retries the primary store.
#[derive(Debug)]
pub struct BackendAvailability {
    available: AtomicBool,
}

impl BackendAvailability {
    /// A breaker that lets calls through.
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
        }
    }

    /// A breaker that is already open, e.g. when the initial connect failed.
    pub fn tripped() -> Self {
        Self {
            available: AtomicBool::new(false),
        }
    }

    /// Whether the primary store may be used.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Mark the primary store unavailable.
    ///
    /// Returns `true` only for the call that actually tripped the breaker.
    pub fn trip(&self) -> bool {
        self.available.swap(false, Ordering::AcqRel)
    }
}

impl Default for BackendAvailability {
    fn default() -> Self {
        Self::new()
    }
}
