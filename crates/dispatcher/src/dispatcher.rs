//! Dispatcher - composite sink fanning each batch out to several sinks

use std::sync::Arc;

use tracing::{error, instrument};

use contracts::{Batch, BatchSink, Payload, RegistryError, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::sinks::{FileSink, IndexHandle, IndexSink, LogSink};

struct Route<P> {
    sink: Box<dyn BatchSink<P>>,
    metrics: Arc<SinkMetrics>,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder<P> {
    name: String,
    routes: Vec<Route<P>>,
    indexes: Vec<(String, IndexHandle<P>)>,
}

impl<P: Clone + Send + Sync + 'static> DispatcherBuilder<P> {
    /// Create a new DispatcherBuilder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Route batches to `sink`, after any sinks already added
    pub fn with_sink<S: BatchSink<P> + 'static>(mut self, sink: S) -> Self {
        self.routes.push(Route {
            sink: Box::new(sink),
            metrics: Arc::new(SinkMetrics::new()),
        });
        self
    }

    /// Route batches to an index sink and keep its read handle
    pub fn with_index(mut self, sink: IndexSink<P>) -> Self {
        let name = BatchSink::<P>::name(&sink).to_string();
        self.indexes.push((name, sink.handle()));
        self.with_sink(sink)
    }

    /// Build the dispatcher
    ///
    /// # Errors
    /// `Empty` when no sink was added
    pub fn build(self) -> Result<Dispatcher<P>, DispatcherError> {
        if self.routes.is_empty() {
            return Err(DispatcherError::Empty { name: self.name });
        }
        Ok(Dispatcher {
            name: self.name,
            routes: self.routes,
            indexes: self.indexes,
        })
    }
}

/// Sink that delivers every batch to each of its sinks in order
///
/// A failing sink does not stop delivery to the others; `accept` reports the
/// first failure after all sinks have run.
pub struct Dispatcher<P> {
    name: String,
    routes: Vec<Route<P>>,
    indexes: Vec<(String, IndexHandle<P>)>,
}

impl<P> Dispatcher<P> {
    /// Number of sinks
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Names of all sinks, in delivery order
    pub fn sink_names(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| r.sink.name().to_string())
            .collect()
    }

    /// Shared metrics handles, usable after the dispatcher is attached
    pub fn metrics_handles(&self) -> Vec<(String, Arc<SinkMetrics>)> {
        self.routes
            .iter()
            .map(|r| (r.sink.name().to_string(), Arc::clone(&r.metrics)))
            .collect()
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.routes
            .iter()
            .map(|r| (r.sink.name().to_string(), r.metrics.snapshot()))
            .collect()
    }

    /// Read handles of all index sinks
    pub fn index_handles(&self) -> Vec<(String, IndexHandle<P>)> {
        self.indexes.clone()
    }
}

impl<P: Clone> Dispatcher<P> {
    fn deliver(route: &mut Route<P>, batch: Batch<P>) -> Result<(), RegistryError> {
        let entries = batch.len();
        match route.sink.accept(batch) {
            Ok(()) => {
                route.metrics.record_accept(entries);
                Ok(())
            }
            Err(e) => {
                route.metrics.inc_failure_count();
                error!(sink = %route.sink.name(), error = %e, "Accept failed");
                Err(e)
            }
        }
    }
}

impl<P: Clone + Send + Sync> BatchSink<P> for Dispatcher<P> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "dispatcher_accept",
        skip(self, batch),
        fields(dispatcher = %self.name, sinks = self.routes.len(), entries = batch.len())
    )]
    fn accept(&mut self, batch: Batch<P>) -> Result<(), RegistryError> {
        let mut first_error = None;

        if let Some((last, rest)) = self.routes.split_last_mut() {
            for route in rest {
                if let Err(e) = Self::deliver(route, batch.clone()) {
                    first_error.get_or_insert(e);
                }
            }
            // last sink takes ownership, no clone
            if let Err(e) = Self::deliver(last, batch) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<(), RegistryError> {
        let mut first_error = None;
        for route in &mut self.routes {
            if let Err(e) = route.sink.flush() {
                error!(sink = %route.sink.name(), error = %e, "Flush failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Create a boxed sink from configuration
#[instrument(
    name = "dispatcher_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn BatchSink<Payload>>, DispatcherError> {
    match config.sink_type {
        SinkType::Index => Ok(Box::new(IndexSink::<Payload>::new(&config.name))),
        SinkType::Log => Ok(Box::new(LogSink::new(&config.name))),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(Box::new(sink))
        }
    }
}

/// Convenience function to create a dispatcher from sink configs
///
/// Index sinks are registered with [`DispatcherBuilder::with_index`] so their
/// contents stay readable after the dispatcher is attached.
#[instrument(name = "dispatcher_create", skip(sink_configs), fields(sinks = sink_configs.len()))]
pub fn create_dispatcher(
    name: &str,
    sink_configs: &[SinkConfig],
) -> Result<Dispatcher<Payload>, DispatcherError> {
    let mut builder = DispatcherBuilder::new(name);
    for config in sink_configs {
        builder = match config.sink_type {
            SinkType::Index => builder.with_index(IndexSink::new(&config.name)),
            _ => builder.with_sink(create_sink(config)?),
        };
    }
    builder.build()
}
