//! Layered error definitions
//!
//! Categorized by source: config / registry / batch / sink / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum RegistryError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Registry Errors =====
    /// A second sink tried to attach to a registry that already has one
    #[error("sink '{rejected}' cannot attach: sink '{attached}' is already attached")]
    DuplicateSinkAttach { attached: String, rejected: String },

    // ===== Batch Errors =====
    /// Batch contains duplicate keys, non-string keys or malformed entries
    #[error("malformed batch from '{origin}': {message}")]
    MalformedBatch { origin: String, message: String },

    // ===== Sink Errors =====
    /// Sink refused a batch
    #[error("sink '{sink_name}' failed to accept batch: {message}")]
    SinkAccept { sink_name: String, message: String },

    /// Sink could not flush buffered output
    #[error("sink '{sink_name}' failed to flush: {message}")]
    SinkFlush { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create duplicate sink attach error
    pub fn duplicate_sink_attach(attached: impl Into<String>, rejected: impl Into<String>) -> Self {
        Self::DuplicateSinkAttach {
            attached: attached.into(),
            rejected: rejected.into(),
        }
    }

    /// Create malformed batch error
    pub fn malformed_batch(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedBatch {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Create sink accept error
    pub fn sink_accept(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkAccept {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink flush error
    pub fn sink_flush(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkFlush {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Programmer errors are never worth retrying or downgrading to a warning.
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, Self::DuplicateSinkAttach { .. })
    }
}
