//! Pipeline statistics and run report.

use std::sync::Arc;
use std::time::Duration;

use contracts::{FlushReport, Payload};
use dispatcher::{IndexHandle, SinkMetrics};
use observability::RegistryMetricsAggregator;
use registry::RegistryStatsSnapshot;
use serde::Serialize;

/// Statistics from a pipeline run
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Fragment files found under the fragments directory
    pub fragments_found: usize,

    /// Fragments that could not be read or decoded
    pub load_failures: u64,

    /// Batches handed to the registry
    pub submitted: usize,

    /// Result of attaching the index (None if attach never happened)
    pub flush: Option<FlushReport>,

    /// Registry counters at the end of the run
    pub registry: RegistryStatsSnapshot,

    /// Read handles to every index sink
    pub indexes: Vec<(String, IndexHandle<Payload>)>,

    /// Per-sink delivery counters
    pub sinks: Vec<(String, Arc<SinkMetrics>)>,

    /// Submission metrics aggregator
    pub metrics: RegistryMetricsAggregator,

    /// Total duration of the pipeline run
    pub duration: Duration,
}

/// JSON form of [`PipelineStats`]
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub fragments_found: usize,
    pub load_failures: u64,
    pub submitted: usize,
    pub diagnostics: u64,
    pub duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush: Option<FlushReport>,
    pub registry: RegistryReport,
    pub indexes: Vec<IndexReport>,
    pub sinks: Vec<SinkReport>,
}

#[derive(Debug, Serialize)]
pub struct RegistryReport {
    pub submitted: u64,
    pub buffered: u64,
    pub forwarded: u64,
    pub flushed: u64,
    pub failed: u64,
}

#[derive(Debug, Serialize)]
pub struct IndexReport {
    pub name: String,
    pub keys: usize,
    pub batches: usize,
    pub overwritten: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SinkReport {
    pub name: String,
    pub accepted: u64,
    pub entries: u64,
    pub failures: u64,
}

impl PipelineStats {
    /// Build the serializable report; `with_keys` lists every index key
    pub fn report(&self, with_keys: bool) -> RunReport {
        RunReport {
            fragments_found: self.fragments_found,
            load_failures: self.load_failures,
            submitted: self.submitted,
            diagnostics: self.metrics.diagnostics,
            duration_secs: self.duration.as_secs_f64(),
            flush: self.flush.clone(),
            registry: RegistryReport {
                submitted: self.registry.submitted,
                buffered: self.registry.buffered,
                forwarded: self.registry.forwarded,
                flushed: self.registry.flushed,
                failed: self.registry.failed,
            },
            indexes: self
                .indexes
                .iter()
                .map(|(name, handle)| IndexReport {
                    name: name.clone(),
                    keys: handle.len(),
                    batches: handle.batches(),
                    overwritten: handle.overwritten(),
                    entries: with_keys.then(|| handle.keys()),
                })
                .collect(),
            sinks: self
                .sinks
                .iter()
                .map(|(name, metrics)| SinkReport {
                    name: name.clone(),
                    accepted: metrics.accept_count(),
                    entries: metrics.entry_count(),
                    failures: metrics.failure_count(),
                })
                .collect(),
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Registry Run Statistics                   ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Fragments found: {}", self.fragments_found);
        println!("   ├─ Load failures: {}", self.load_failures);
        println!("   └─ Batches submitted: {}", self.submitted);

        println!("\n📥 Registry");
        println!("   ├─ Buffered before attach: {}", self.registry.buffered);
        match &self.flush {
            Some(flush) => println!(
                "   ├─ Flushed on attach: {} ({} refused)",
                flush.flushed, flush.failed
            ),
            None => println!("   ├─ Flushed on attach: (never attached)"),
        }
        println!("   ├─ Forwarded after attach: {}", self.registry.forwarded);
        println!("   └─ Sink failures: {}", self.registry.failed);

        if !self.indexes.is_empty() {
            println!("\n📚 Indexes");
            for (i, (name, handle)) in self.indexes.iter().enumerate() {
                let prefix = if i == self.indexes.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} keys from {} batches ({} replaced)",
                    prefix,
                    name,
                    handle.len(),
                    handle.batches(),
                    handle.overwritten()
                );
            }
        }

        println!("\n📤 Sinks");
        for (i, (name, metrics)) in self.sinks.iter().enumerate() {
            let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {}: {} batches, {} entries, {} failures",
                prefix,
                name,
                metrics.accept_count(),
                metrics.entry_count(),
                metrics.failure_count()
            );
        }

        println!("\n{}", self.metrics.summary());
    }
}
