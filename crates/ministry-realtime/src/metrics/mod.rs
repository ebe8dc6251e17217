//! Overlay engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::notification::state::SubmitOutcome;

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct OverlayMetrics {
    /// Candidates offered through `submit`
    pub submitted: AtomicU64,
    /// Candidates that became active
    pub accepted: AtomicU64,
    /// Rejected because another notice was active
    pub rejected_busy: AtomicU64,
    /// Rejected by session dedup
    pub rejected_duplicate: AtomicU64,
    /// Rejected as toast class
    pub rejected_not_overlay: AtomicU64,
    /// Rejected after shutdown
    pub rejected_unmounted: AtomicU64,
    /// Dismissals of an active notice
    pub dismissed: AtomicU64,
    /// Failed `mark_read` calls
    pub mark_read_failures: AtomicU64,
    /// `fetch_unread` calls issued
    pub fetches: AtomicU64,
    /// Failed `fetch_unread` calls
    pub fetch_failures: AtomicU64,
    /// Fallback poll activations
    pub polls_started: AtomicU64,
    /// Toasts relayed
    pub toasts_relayed: AtomicU64,
}

impl OverlayMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one submit and its outcome
    pub fn record_submit(&self, outcome: SubmitOutcome) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            SubmitOutcome::Accepted => &self.accepted,
            SubmitOutcome::Busy => &self.rejected_busy,
            SubmitOutcome::AlreadyShown => &self.rejected_duplicate,
            SubmitOutcome::NotOverlay => &self.rejected_not_overlay,
            SubmitOutcome::Unmounted => &self.rejected_unmounted,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment a counter
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected_busy: self.rejected_busy.load(Ordering::Relaxed),
            rejected_duplicate: self.rejected_duplicate.load(Ordering::Relaxed),
            rejected_not_overlay: self.rejected_not_overlay.load(Ordering::Relaxed),
            rejected_unmounted: self.rejected_unmounted.load(Ordering::Relaxed),
            dismissed: self.dismissed.load(Ordering::Relaxed),
            mark_read_failures: self.mark_read_failures.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            polls_started: self.polls_started.load(Ordering::Relaxed),
            toasts_relayed: self.toasts_relayed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Candidates offered
    pub submitted: u64,
    /// Candidates accepted
    pub accepted: u64,
    /// Rejected while busy
    pub rejected_busy: u64,
    /// Rejected as already shown
    pub rejected_duplicate: u64,
    /// Rejected as toast class
    pub rejected_not_overlay: u64,
    /// Rejected after shutdown
    pub rejected_unmounted: u64,
    /// Dismissals
    pub dismissed: u64,
    /// Failed mark-read calls
    pub mark_read_failures: u64,
    /// Fetches issued
    pub fetches: u64,
    /// Failed fetches
    pub fetch_failures: u64,
    /// Poll activations
    pub polls_started: u64,
    /// Toasts relayed
    pub toasts_relayed: u64,
}
