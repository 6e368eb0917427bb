//! Cancellation for search executions.
//!
//! Every result store owns a `SearchVersionTracker`. The execution started
//! for the store receives a `CancellationToken` bound to the version current
//! at start time. Terminating the store moves the tracker on, after which the
//! token reports cancelled and any rows the execution still produces are
//! dropped by the result sink.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Version counter shared between a result store and its execution.
#[derive(Debug, Clone, Default)]
pub struct SearchVersionTracker {
    version: Arc<AtomicU64>,
}

impl SearchVersionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels every token issued so far. Returns the new version.
    pub fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Token that stays live until the next call to `next_version`.
    pub fn current_token(&self) -> CancellationToken {
        CancellationToken {
            tracker: Some(self.version.clone()),
            issued_at: self.current_version(),
        }
    }
}

/// Handed to a `SearchProvider`; checked cooperatively while it produces rows.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    tracker: Option<Arc<AtomicU64>>,
    issued_at: u64,
}

impl CancellationToken {
    /// A token nothing can cancel.
    pub fn noop() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.tracker
            .as_ref()
            .is_some_and(|version| version.load(Ordering::Acquire) != self.issued_at)
    }
}
