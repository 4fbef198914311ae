//! IndexSink - the documentation index fed by the registry
//!
//! Merges every accepted batch into one sorted `identifier -> payload` map.
//! A key re-registered by a later batch replaces the earlier payload.

use std::collections::BTreeMap;
use std::sync::Arc;

use contracts::{Batch, BatchSink, RegistryError};
use parking_lot::RwLock;
use tracing::{debug, instrument};

/// Merged index contents
#[derive(Debug, Clone)]
pub struct DocIndex<P> {
    entries: BTreeMap<String, P>,
    batches: usize,
    overwritten: usize,
    origins: Vec<String>,
}

impl<P> Default for DocIndex<P> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            batches: 0,
            overwritten: 0,
            origins: Vec::new(),
        }
    }
}

impl<P> DocIndex<P> {
    fn merge(&mut self, batch: Batch<P>) {
        self.batches += 1;
        if let Some(origin) = batch.origin() {
            self.origins.push(origin.to_string());
        }
        for (key, payload) in batch.into_entries() {
            if self.entries.insert(key, payload).is_some() {
                self.overwritten += 1;
            }
        }
    }
}

/// Cloneable read handle to an [`IndexSink`]'s contents
///
/// Stays valid after the sink itself has been moved into a registry.
#[derive(Debug)]
pub struct IndexHandle<P> {
    inner: Arc<RwLock<DocIndex<P>>>,
}

impl<P> Clone for IndexHandle<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Clone> IndexHandle<P> {
    pub fn get(&self, key: &str) -> Option<P> {
        self.inner.read().entries.get(key).cloned()
    }

    /// Copy of the full index
    pub fn snapshot(&self) -> BTreeMap<String, P> {
        self.inner.read().entries.clone()
    }
}

impl<P> IndexHandle<P> {
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().entries.contains_key(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().entries.keys().cloned().collect()
    }

    /// Number of batches merged so far
    pub fn batches(&self) -> usize {
        self.inner.read().batches
    }

    /// Number of keys replaced by a later batch
    pub fn overwritten(&self) -> usize {
        self.inner.read().overwritten
    }

    /// Origins of merged batches, in merge order
    pub fn origins(&self) -> Vec<String> {
        self.inner.read().origins.clone()
    }
}

/// In-memory documentation index sink
pub struct IndexSink<P> {
    name: String,
    handle: IndexHandle<P>,
}

impl<P> IndexSink<P> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: IndexHandle {
                inner: Arc::new(RwLock::new(DocIndex::default())),
            },
        }
    }

    /// Read handle sharing this sink's index
    pub fn handle(&self) -> IndexHandle<P> {
        self.handle.clone()
    }
}

impl<P: Send + Sync> BatchSink<P> for IndexSink<P> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "index_sink_accept",
        skip(self, batch),
        fields(sink = %self.name, origin = batch.origin_or_anonymous(), entries = batch.len())
    )]
    fn accept(&mut self, batch: Batch<P>) -> Result<(), RegistryError> {
        let mut index = self.handle.inner.write();
        let before = index.overwritten;
        index.merge(batch);

        if index.overwritten > before {
            debug!(
                sink = %self.name,
                replaced = index.overwritten - before,
                "Batch re-registered existing keys"
            );
        }
        Ok(())
    }
}
