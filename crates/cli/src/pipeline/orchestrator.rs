//! Pipeline orchestrator - loads fragments and drives the registry.
//!
//! Fragments are decoded on blocking tasks and submitted in completion order,
//! so arrival order is whatever the file system and scheduler produce. The
//! index attaches after a configurable number of submissions.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use contracts::{Payload, RegistryBlueprint};
use dispatcher::{create_dispatcher, Dispatcher};
use ingestion::{discover, Fragment, FragmentLoader};
use registry::DeferredRegistry;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::PipelineStats;
use crate::error::{CliError, Result};

/// Name of the composite sink attached to the registry
pub const DISPATCHER_NAME: &str = "doc-index";

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The registry blueprint configuration
    pub blueprint: RegistryBlueprint,

    /// Directory scanned for fragments
    pub fragments_dir: PathBuf,

    /// Submissions before the index attaches (None = after all fragments)
    pub attach_after: Option<usize>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline<'r> {
    config: PipelineConfig,
    registry: &'r DeferredRegistry<Payload>,
}

impl<'r> Pipeline<'r> {
    /// Create a new pipeline feeding `registry`
    pub fn new(config: PipelineConfig, registry: &'r DeferredRegistry<Payload>) -> Self {
        Self { config, registry }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let root = self.config.fragments_dir.as_path();
        if !root.is_dir() {
            return Err(CliError::fragments_dir_not_found(root));
        }
        let paths = discover(root)?;
        info!(
            dir = %root.display(),
            fragments = paths.len(),
            "Fragments discovered"
        );

        // Build sinks up front so a bad sink config fails before any load
        let dispatcher = create_dispatcher(DISPATCHER_NAME, &blueprint.sinks)?;
        let mut stats = PipelineStats {
            fragments_found: paths.len(),
            indexes: dispatcher.index_handles(),
            sinks: dispatcher.metrics_handles(),
            ..Default::default()
        };
        let mut pending_sink = Some(dispatcher);

        let mut loads = spawn_loads(
            FragmentLoader::new(blueprint.registry.duplicate_keys),
            root,
            paths,
        );
        let attach_after = self.config.attach_after.unwrap_or(usize::MAX);

        while let Some(joined) = loads.join_next().await {
            if stats.submitted >= attach_after {
                self.attach(&mut pending_sink, &mut stats)?;
            }

            let loaded = joined.map_err(|e| CliError::pipeline_execution(e.to_string()))?;
            match loaded {
                Ok(fragment) => self.submit(fragment, &mut stats),
                Err(e) => {
                    warn!(error = %e, "Fragment failed to load, skipped");
                    stats.load_failures += 1;
                }
            }
        }

        // Remaining case: fewer fragments than `attach_after`, or none at all
        self.attach(&mut pending_sink, &mut stats)?;
        self.registry.flush_sink()?;

        stats.registry = self.registry.stats();
        stats.duration = start_time.elapsed();
        Ok(stats)
    }

    fn submit(&self, fragment: Fragment, stats: &mut PipelineStats) {
        let entries = fragment.len();
        stats.metrics.record_diagnostics(fragment.diagnostics.len());
        stats.submitted += 1;

        match self.registry.submit(fragment.batch) {
            Ok(delivery) => {
                debug!(
                    fragment = %fragment.name,
                    entries,
                    path = delivery.as_str(),
                    "Fragment submitted"
                );
                stats.metrics.update(entries, &delivery);
            }
            Err(e) => {
                warn!(fragment = %fragment.name, error = %e, "Sink refused fragment");
                stats.metrics.record_failure();
            }
        }
    }

    /// Attach the dispatcher unless it was attached already
    fn attach(
        &self,
        pending_sink: &mut Option<Dispatcher<Payload>>,
        stats: &mut PipelineStats,
    ) -> Result<()> {
        let Some(dispatcher) = pending_sink.take() else {
            return Ok(());
        };

        info!(
            submitted = stats.submitted,
            pending = self.registry.pending_len(),
            "Attaching documentation index"
        );
        let report = self.registry.attach_sink(dispatcher)?;
        stats.metrics.update_flush(&report);
        stats.flush = Some(report);
        Ok(())
    }
}

fn spawn_loads(
    loader: FragmentLoader,
    root: &Path,
    paths: Vec<PathBuf>,
) -> JoinSet<ingestion::Result<Fragment>> {
    let root: Arc<Path> = Arc::from(root);
    let mut loads = JoinSet::new();
    for path in paths {
        let root = Arc::clone(&root);
        loads.spawn_blocking(move || loader.load_in(&root, &path));
    }
    loads
}
