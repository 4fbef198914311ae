//! BatchSink trait - the consumer side of the registry
//!
//! Defines the abstract interface for Sinks.

use crate::{Batch, RegistryError};

/// Batch consumer trait
///
/// All sink implementations must implement this trait. Delivery is
/// synchronous: `accept` runs while the registry holds its lock, so a sink
/// must not call back into the registry that feeds it.
pub trait BatchSink<P>: Send {
    /// Sink name (used for logging/metrics and duplicate-attach reports)
    fn name(&self) -> &str;

    /// Merge one batch into the sink
    ///
    /// # Errors
    /// Returns accept error (should include context)
    fn accept(&mut self, batch: Batch<P>) -> Result<(), RegistryError>;

    /// Flush buffered output (if any)
    fn flush(&mut self) -> Result<(), RegistryError> {
        Ok(())
    }
}

impl<P, S: BatchSink<P> + ?Sized> BatchSink<P> for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn accept(&mut self, batch: Batch<P>) -> Result<(), RegistryError> {
        (**self).accept(batch)
    }

    fn flush(&mut self) -> Result<(), RegistryError> {
        (**self).flush()
    }
}
