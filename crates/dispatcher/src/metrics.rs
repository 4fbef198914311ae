//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Total accepted batches
    accept_count: AtomicU64,
    /// Total entries in accepted batches
    entry_count: AtomicU64,
    /// Total refused batches
    failure_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total accept count
    pub fn accept_count(&self) -> u64 {
        self.accept_count.load(Ordering::Relaxed)
    }

    /// Record an accepted batch of `entries` entries
    pub fn record_accept(&self, entries: usize) {
        self.accept_count.fetch_add(1, Ordering::Relaxed);
        self.entry_count
            .fetch_add(entries as u64, Ordering::Relaxed);
    }

    /// Get total entry count
    pub fn entry_count(&self) -> u64 {
        self.entry_count.load(Ordering::Relaxed)
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            accept_count: self.accept_count(),
            entry_count: self.entry_count(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub accept_count: u64,
    pub entry_count: u64,
    pub failure_count: u64,
}
