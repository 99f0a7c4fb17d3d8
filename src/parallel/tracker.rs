use crossbeam::sync::WaitGroup;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts in-flight tasks and lets the coordinating thread block until every
/// registered task has finished.
#[derive(Debug)]
pub struct CompletionTracker {
    group: WaitGroup,
    outstanding: Arc<AtomicUsize>,
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self {
            group: WaitGroup::new(),
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register one task. The returned ticket must travel with the task and
    /// is counted as finished when dropped.
    pub fn register(&self) -> Ticket {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        Ticket {
            _group: self.group.clone(),
            outstanding: Arc::clone(&self.outstanding),
        }
    }

    /// Tasks registered but not finished yet
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Block until every ticket handed out so far has been dropped.
    pub fn wait(self) {
        self.group.wait();
    }
}

/// Membership of one task in a [`CompletionTracker`].
#[derive(Debug)]
pub struct Ticket {
    _group: WaitGroup,
    outstanding: Arc<AtomicUsize>,
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}
