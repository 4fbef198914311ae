//! Batch - one fragment's `identifier -> payload` mapping
//!
//! A batch is handed to the registry atomically and delivered to the sink
//! as a unit. Entry order follows first insertion.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::RegistryError;

/// Opaque payload used by the process-wide registry.
///
/// The registry never looks inside it; sinks may.
pub type Payload = serde_json::Value;

/// Ordered mapping from identifier to opaque payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch<P> {
    /// Fragment this batch came from (diagnostics only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<String>,

    /// Entries in insertion order
    entries: IndexMap<String, P>,
}

impl<P> Default for Batch<P> {
    fn default() -> Self {
        Self {
            origin: None,
            entries: IndexMap::new(),
        }
    }
}

impl<P> Batch<P> {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an origin label
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Origin label, if any
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Origin label or `"<anonymous>"`
    pub fn origin_or_anonymous(&self) -> &str {
        self.origin.as_deref().unwrap_or("<anonymous>")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&P> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &P)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Borrow the underlying map
    pub fn entries(&self) -> &IndexMap<String, P> {
        &self.entries
    }

    /// Consume into the underlying map
    pub fn into_entries(self) -> IndexMap<String, P> {
        self.entries
    }
}

impl<P> From<IndexMap<String, P>> for Batch<P> {
    fn from(entries: IndexMap<String, P>) -> Self {
        Self {
            origin: None,
            entries,
        }
    }
}

/// Collects entries with last-write-wins and no diagnostics.
///
/// Use [`BatchBuilder`] when duplicates must be reported.
impl<K: Into<String>, P> FromIterator<(K, P)> for Batch<P> {
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        Self {
            origin: None,
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// How a batch treats duplicate or malformed entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// Keep the later payload, record a diagnostic
    #[default]
    LastWriteWins,
    /// Fail the whole batch
    Reject,
}

/// Non-fatal note recorded while building a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub origin: String,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Key appeared more than once; the later payload was kept
    DuplicateKey { key: String },
    /// Entry at `index` could not be used
    SkippedEntry { index: usize, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::DuplicateKey { key } => {
                write!(f, "{}: duplicate key '{}', last write wins", self.origin, key)
            }
            DiagnosticKind::SkippedEntry { index, reason } => {
                write!(f, "{}: entry #{} skipped: {}", self.origin, index, reason)
            }
        }
    }
}

/// Builds a [`Batch`] while enforcing a [`DuplicateKeyPolicy`]
#[derive(Debug)]
pub struct BatchBuilder<P> {
    origin: String,
    policy: DuplicateKeyPolicy,
    entries: IndexMap<String, P>,
    diagnostics: Vec<Diagnostic>,
}

impl<P> BatchBuilder<P> {
    pub fn new(origin: impl Into<String>, policy: DuplicateKeyPolicy) -> Self {
        Self {
            origin: origin.into(),
            policy,
            entries: IndexMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Insert one entry
    ///
    /// # Errors
    /// `MalformedBatch` on a duplicate key under [`DuplicateKeyPolicy::Reject`]
    pub fn insert(&mut self, key: impl Into<String>, payload: P) -> Result<(), RegistryError> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            match self.policy {
                DuplicateKeyPolicy::Reject => {
                    return Err(RegistryError::malformed_batch(
                        &self.origin,
                        format!("duplicate key '{key}'"),
                    ));
                }
                DuplicateKeyPolicy::LastWriteWins => {
                    self.diagnostics.push(Diagnostic {
                        origin: self.origin.clone(),
                        kind: DiagnosticKind::DuplicateKey { key: key.clone() },
                    });
                }
            }
        }
        // IndexMap keeps the original position and replaces the value
        self.entries.insert(key, payload);
        Ok(())
    }

    /// Record an entry that cannot be represented (non-string key, wrong shape)
    ///
    /// # Errors
    /// `MalformedBatch` under [`DuplicateKeyPolicy::Reject`]
    pub fn skip(&mut self, index: usize, reason: impl Into<String>) -> Result<(), RegistryError> {
        let reason = reason.into();
        match self.policy {
            DuplicateKeyPolicy::Reject => Err(RegistryError::malformed_batch(
                &self.origin,
                format!("entry #{index}: {reason}"),
            )),
            DuplicateKeyPolicy::LastWriteWins => {
                self.diagnostics.push(Diagnostic {
                    origin: self.origin.clone(),
                    kind: DiagnosticKind::SkippedEntry { index, reason },
                });
                Ok(())
            }
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Finish into a batch labelled with the builder's origin
    pub fn finish(self) -> (Batch<P>, Vec<Diagnostic>) {
        let batch = Batch {
            origin: Some(self.origin),
            entries: self.entries,
        };
        (batch, self.diagnostics)
    }
}
