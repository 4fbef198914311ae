//! LogSink - logs batch summary via tracing

use contracts::{Batch, BatchSink, RegistryError};
use tracing::{info, instrument};

/// Number of keys shown per batch summary
const SAMPLE_KEYS: usize = 3;

/// Sink that logs batch summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_batch_summary<P>(&self, batch: &Batch<P>) {
        let sample: Vec<&str> = batch.keys().take(SAMPLE_KEYS).collect();

        info!(
            sink = %self.name,
            origin = batch.origin_or_anonymous(),
            entries = batch.len(),
            sample = ?sample,
            "Batch received"
        );
    }
}

impl<P> BatchSink<P> for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_accept",
        skip(self, batch),
        fields(sink = %self.name, entries = batch.len())
    )]
    fn accept(&mut self, batch: Batch<P>) -> Result<(), RegistryError> {
        self.log_batch_summary(&batch);
        Ok(())
    }
}
