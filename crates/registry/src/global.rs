//! Process-wide registry of documentation type implementations
//!
//! Fragments call [`submit`] as they load; the documentation index calls
//! [`attach_sink`] once when it is ready. Nothing else touches the buffer.

use std::sync::LazyLock;

use contracts::{Batch, BatchSink, Delivery, FlushReport, Payload, RegistryError};

use crate::{DeferredRegistry, RegistryStatsSnapshot};

static TYPE_IMPLS: LazyLock<DeferredRegistry<Payload>> = LazyLock::new(DeferredRegistry::new);

/// The process-wide registry instance
pub fn registry() -> &'static DeferredRegistry<Payload> {
    &TYPE_IMPLS
}

/// Submit one fragment's batch to the process-wide registry
pub fn submit(batch: Batch<Payload>) -> Result<Delivery, RegistryError> {
    TYPE_IMPLS.submit(batch)
}

/// Attach the process-wide sink; fails if one is already attached
pub fn attach_sink<S>(sink: S) -> Result<FlushReport, RegistryError>
where
    S: BatchSink<Payload> + 'static,
{
    TYPE_IMPLS.attach_sink(sink)
}

pub fn is_attached() -> bool {
    TYPE_IMPLS.is_attached()
}

pub fn pending_len() -> usize {
    TYPE_IMPLS.pending_len()
}

pub fn stats() -> RegistryStatsSnapshot {
    TYPE_IMPLS.stats()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_singleton() {
        let r1 = registry();
        let r2 = registry();
        // Both references must point to the exact same allocation.
        assert!(std::ptr::eq(r1, r2));
    }
}
