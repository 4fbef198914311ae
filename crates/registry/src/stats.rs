//! Delivery counters for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single registry
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Total `submit` calls
    submitted: AtomicU64,
    /// Batches delivered straight to an attached sink
    forwarded: AtomicU64,
    /// Batches queued while no sink was attached
    buffered: AtomicU64,
    /// Queued batches handed over during attach
    flushed: AtomicU64,
    /// Batches the sink refused
    failed: AtomicU64,
    /// Attach calls rejected because a sink was already present
    rejected_attaches: AtomicU64,
}

impl RegistryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_buffered(&self) {
        self.buffered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_flushed(&self, count: usize) {
        self.flushed.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected_attaches(&self) {
        self.rejected_attaches.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> RegistryStatsSnapshot {
        RegistryStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            buffered: self.buffered.load(Ordering::Relaxed),
            flushed: self.flushed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected_attaches: self.rejected_attaches.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of registry counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStatsSnapshot {
    pub submitted: u64,
    pub forwarded: u64,
    pub buffered: u64,
    pub flushed: u64,
    pub failed: u64,
    pub rejected_attaches: u64,
}

impl RegistryStatsSnapshot {
    /// Batches that reached the sink, successfully or not
    pub fn delivered(&self) -> u64 {
        self.forwarded + self.flushed
    }

    /// Batches still waiting for a sink
    ///
    /// Counters are read one by one, so a snapshot racing an attach can
    /// see more flushed than buffered batches; that reads as zero.
    pub fn outstanding(&self) -> u64 {
        self.buffered.saturating_sub(self.flushed)
    }
}
