//! Completion Dispatcher
//!
//! Ordered delivery queue that accepts actions from any thread and runs them, in enqueue order,
//! on whichever thread calls [`CompletionDispatcher::drain`]. The host calls `drain` from its
//! designated context, typically once per frame or tick.
//!
//! Draining swaps the queue out under the lock and runs the batch outside it, so producers are
//! never blocked by a running callback. Actions posted while a batch runs land in the next batch.

use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Deferred zero-argument unit of work.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Outcome counts for one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub executed: usize,
    pub panicked: usize,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.executed == 0
    }
}

#[derive(Default)]
pub struct CompletionDispatcher {
    queue: Mutex<Vec<Action>>,
}

impl CompletionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Enqueue `action`. Never runs it inline, even on the draining thread.
    pub fn post<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.lock().push(Box::new(action));
    }

    /// Run every action queued before this call, in order.
    ///
    /// A panicking action is contained and the rest of the batch still runs.
    pub fn drain(&self) -> DrainReport {
        let batch = std::mem::take(&mut *self.queue.lock());

        let mut report = DrainReport::default();
        for action in batch {
            report.executed += 1;
            if panic::catch_unwind(AssertUnwindSafe(action)).is_err() {
                report.panicked += 1;
            }
        }
        report
    }

    /// Number of actions waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

impl std::fmt::Debug for CompletionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionDispatcher")
            .field("pending", &self.pending())
            .finish()
    }
}
