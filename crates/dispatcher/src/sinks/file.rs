//! FileSink - appends one JSON line per batch

use contracts::{Batch, BatchSink, RegistryError};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file (JSON Lines)
    pub path: PathBuf,
    /// Append to an existing file instead of truncating it
    pub append: bool,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./type_impls.jsonl"));
        let append = params
            .get("append")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self { path, append }
    }
}

#[derive(Serialize)]
struct BatchRecord<'a, P> {
    received_at: String,
    #[serde(flatten)]
    batch: &'a Batch<P>,
}

/// Sink that writes batches to a JSON Lines file
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(config.append)
            .truncate(!config.append)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            writer: BufWriter::new(file),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    /// Write one batch as a complete line
    ///
    /// The record is encoded in memory first, so an encoding error leaves
    /// the file untouched.
    fn write_batch<P: Serialize>(&mut self, batch: &Batch<P>) -> std::io::Result<()> {
        let record = BatchRecord {
            received_at: chrono::Utc::now().to_rfc3339(),
            batch,
        };
        let mut line = serde_json::to_vec(&record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        line.push(b'\n');
        self.writer.write_all(&line)
    }
}

impl<P: Serialize> BatchSink<P> for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_accept",
        skip(self, batch),
        fields(sink = %self.name, entries = batch.len())
    )]
    fn accept(&mut self, batch: Batch<P>) -> Result<(), RegistryError> {
        self.write_batch(&batch).map_err(|e| {
            error!(
                sink = %self.name,
                path = %self.config.path.display(),
                origin = batch.origin_or_anonymous(),
                error = %e,
                "Write failed"
            );
            RegistryError::sink_accept(&self.name, e.to_string())
        })
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    fn flush(&mut self) -> Result<(), RegistryError> {
        self.writer
            .flush()
            .map_err(|e| RegistryError::sink_flush(&self.name, e.to_string()))?;
        debug!(sink = %self.name, path = %self.config.path.display(), "FileSink flushed");
        Ok(())
    }
}
