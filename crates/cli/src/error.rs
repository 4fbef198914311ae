//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Neither the configuration nor the command line names a fragments directory
    #[error("No fragments directory: set registry.fragments_dir or pass --fragments")]
    FragmentsDirMissing,

    /// Fragments directory does not exist
    #[error("Fragments directory not found: {}", path.display())]
    FragmentsDirNotFound { path: PathBuf },

    /// Registry or configuration error
    #[error(transparent)]
    Registry(#[from] contracts::RegistryError),

    /// Sink construction error
    #[error("Failed to build sinks: {0}")]
    Dispatcher(#[from] dispatcher::DispatcherError),

    /// Fragment discovery error
    #[error("Failed to discover fragments: {0}")]
    Ingestion(#[from] ingestion::IngestionError),

    /// Pipeline execution error
    #[error("Pipeline execution failed: {message}")]
    PipelineExecution { message: String },

    /// Generic error wrapper
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn fragments_dir_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FragmentsDirNotFound { path: path.into() }
    }

    pub fn pipeline_execution(message: impl Into<String>) -> Self {
        Self::PipelineExecution {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
