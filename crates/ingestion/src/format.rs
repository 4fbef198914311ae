//! Fragment file formats
//!
//! - `Json`: a JSON array of `[key, payload]` pairs
//! - `Script`: the generated loader script that wraps the same array in
//!   `Object.fromEntries(...)`, optionally followed by a `//{...}` trailer
//!
//! Only the array literal is extracted. Nothing else in a script is read.

use serde_json::Value;

use crate::error::{IngestionError, Result};

const FROM_ENTRIES: &str = "Object.fromEntries(";

/// Fragment file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentFormat {
    Json,
    Script,
}

impl FragmentFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "js" => Some(Self::Script),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Script => "script",
        }
    }
}

/// Offsets trailer emitted after generated scripts
///
/// `//{"start":55,"fragment_lengths":[29,29,30,30,29]}`
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct FragmentTrailer {
    pub start: usize,
    pub fragment_lengths: Vec<usize>,
}

/// Extract the entries array from fragment content
pub fn extract_entries(fragment: &str, content: &str, format: FragmentFormat) -> Result<Value> {
    let source = match format {
        FragmentFormat::Json => content.trim_start(),
        FragmentFormat::Script => {
            let start = content.find(FROM_ENTRIES).ok_or_else(|| {
                IngestionError::decode(fragment, format!("no `{FROM_ENTRIES}` call found"))
            })?;
            &content[start + FROM_ENTRIES.len()..]
        }
    };

    // Parse exactly one value; whatever follows the array is ignored
    let mut values = serde_json::Deserializer::from_str(source).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(IngestionError::decode(fragment, e.to_string())),
        None => Err(IngestionError::decode(fragment, "fragment is empty")),
    }
}

/// Parse the `//{...}` trailer of a generated script, if present
pub fn parse_trailer(content: &str) -> Option<FragmentTrailer> {
    let last = content.lines().rev().find(|l| !l.trim().is_empty())?;
    let json = last.trim().strip_prefix("//")?;
    serde_json::from_str(json).ok()
}
