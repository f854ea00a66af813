//! Operation Gate
//!
//! Single global in-flight flag shared by Init, Show and Reshow.

use std::sync::atomic::{AtomicBool, Ordering};

/// Admits a new operation only while idle.
#[derive(Debug, Default)]
pub struct OperationGate {
    in_progress: AtomicBool,
}

impl OperationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle -> InProgress. Returns false if an operation is already active.
    pub fn try_begin(&self) -> bool {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// InProgress -> Idle. A no-op when already idle.
    pub fn end(&self) {
        self.in_progress.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }
}
