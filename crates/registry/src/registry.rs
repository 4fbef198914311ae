//! DeferredRegistry - buffers batches until the sink attaches
//!
//! Two states, one transition:
//! - `NoSink`: `submit` appends to the pending buffer
//! - `HasSink`: `submit` forwards to the sink synchronously
//!
//! `attach_sink` moves `NoSink -> HasSink` and drains the buffer in FIFO
//! order. Both operations hold the same lock across "check state -> act", so
//! a batch racing an attach is either flushed or forwarded, never dropped.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::{debug, error, info, instrument};

use contracts::{Batch, BatchSink, Delivery, FlushReport, RegistryError};

use crate::stats::{RegistryStats, RegistryStatsSnapshot};

type BoxedSink<P> = Box<dyn BatchSink<P>>;

enum State<P> {
    NoSink { pending: VecDeque<Batch<P>> },
    HasSink { sink: BoxedSink<P> },
}

/// Key-to-payload registry that tolerates producers arriving before the sink
pub struct DeferredRegistry<P> {
    state: Mutex<State<P>>,
    stats: RegistryStats,
}

impl<P: Send + 'static> Default for DeferredRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Send + 'static> DeferredRegistry<P> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::NoSink {
                pending: VecDeque::new(),
            }),
            stats: RegistryStats::new(),
        }
    }

    /// Hand one batch to the registry
    ///
    /// Buffers when no sink is attached ("not ready" is not an error),
    /// otherwise delivers immediately.
    ///
    /// # Errors
    /// The attached sink's accept error. The batch is not re-buffered.
    #[instrument(
        name = "registry_submit",
        skip_all,
        fields(origin = %batch.origin_or_anonymous(), entries = batch.len())
    )]
    pub fn submit(&self, batch: Batch<P>) -> Result<Delivery, RegistryError> {
        let entries = batch.len();
        self.stats.inc_submitted();

        let mut state = self.state.lock();
        let result = match &mut *state {
            State::NoSink { pending } => {
                pending.push_back(batch);
                self.stats.inc_buffered();
                debug!(pending = pending.len(), "No sink attached, batch buffered");
                Ok(Delivery::Buffered {
                    pending: pending.len(),
                })
            }
            State::HasSink { sink } => {
                self.stats.inc_forwarded();
                deliver(sink.as_mut(), batch, &self.stats).map(|()| Delivery::Forwarded)
            }
        };
        drop(state);

        if let Ok(delivery) = &result {
            observability::record_batch_submitted(entries, delivery);
        }
        result
    }

    /// Install the process-wide sink and drain the pending buffer into it
    ///
    /// A batch the sink refuses during the drain is logged and counted;
    /// the remaining batches are still delivered.
    ///
    /// # Errors
    /// `DuplicateSinkAttach` if a sink is already attached. The attached
    /// sink is untouched and `sink` is dropped.
    #[instrument(name = "registry_attach_sink", skip_all, fields(sink = %sink.name()))]
    pub fn attach_sink<S>(&self, sink: S) -> Result<FlushReport, RegistryError>
    where
        S: BatchSink<P> + 'static,
    {
        let mut sink: BoxedSink<P> = Box::new(sink);
        let mut state = self.state.lock();

        let pending = match &mut *state {
            State::NoSink { pending } => std::mem::take(pending),
            State::HasSink { sink: attached } => {
                self.stats.inc_rejected_attaches();
                observability::record_attach_rejected(sink.name());
                error!(
                    attached = %attached.name(),
                    rejected = %sink.name(),
                    "Sink already attached, second attach rejected"
                );
                return Err(RegistryError::duplicate_sink_attach(
                    attached.name(),
                    sink.name(),
                ));
            }
        };

        let mut report = FlushReport {
            sink: sink.name().to_string(),
            flushed: pending.len(),
            failed: 0,
        };
        for batch in pending {
            if deliver(sink.as_mut(), batch, &self.stats).is_err() {
                report.failed += 1;
            }
        }

        *state = State::HasSink { sink };
        drop(state);

        self.stats.add_flushed(report.flushed);
        observability::record_flush(&report);
        info!(
            sink = %report.sink,
            flushed = report.flushed,
            failed = report.failed,
            "Sink attached, pending batches flushed"
        );

        Ok(report)
    }

    /// Forward `flush` to the attached sink; no-op before attach
    pub fn flush_sink(&self) -> Result<(), RegistryError> {
        match &mut *self.state.lock() {
            State::HasSink { sink } => sink.flush(),
            State::NoSink { .. } => Ok(()),
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(&*self.state.lock(), State::HasSink { .. })
    }

    /// Name of the attached sink
    pub fn sink_name(&self) -> Option<String> {
        match &*self.state.lock() {
            State::HasSink { sink } => Some(sink.name().to_string()),
            State::NoSink { .. } => None,
        }
    }

    /// Batches waiting for a sink; always 0 once attached
    pub fn pending_len(&self) -> usize {
        match &*self.state.lock() {
            State::NoSink { pending } => pending.len(),
            State::HasSink { .. } => 0,
        }
    }

    pub fn stats(&self) -> RegistryStatsSnapshot {
        self.stats.snapshot()
    }
}

fn deliver<P, S: BatchSink<P> + ?Sized>(
    sink: &mut S,
    batch: Batch<P>,
    stats: &RegistryStats,
) -> Result<(), RegistryError> {
    let origin = batch.origin().map(str::to_owned);
    sink.accept(batch).inspect_err(|e| {
        stats.inc_failed();
        observability::record_sink_failure(sink.name());
        error!(
            sink = %sink.name(),
            origin = origin.as_deref().unwrap_or("<anonymous>"),
            error = %e,
            "Sink rejected batch"
        );
    })
}
