//! Delivery outcomes reported by the registry

use serde::Serialize;

/// Path a submitted batch took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "path")]
pub enum Delivery {
    /// Sink was attached; batch accepted synchronously
    Forwarded,
    /// No sink yet; batch queued at position `pending - 1`
    Buffered { pending: usize },
}

impl Delivery {
    pub fn is_forwarded(&self) -> bool {
        matches!(self, Self::Forwarded)
    }

    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forwarded => "forwarded",
            Self::Buffered { .. } => "buffered",
        }
    }
}

/// Result of attaching the sink and draining the pending buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    /// Name of the attached sink
    pub sink: String,
    /// Pending batches handed to the sink
    pub flushed: usize,
    /// Of those, how many the sink refused
    pub failed: usize,
}

impl FlushReport {
    pub fn delivered_ok(&self) -> usize {
        self.flushed - self.failed
    }
}
