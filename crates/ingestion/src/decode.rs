//! Decode an entries array into a batch

use contracts::{Batch, BatchBuilder, Diagnostic, DuplicateKeyPolicy, Payload};
use serde_json::Value;

use crate::error::{IngestionError, Result};

/// Turn `[[key, payload], ...]` into a batch under `policy`
///
/// Entries that are not two-element arrays, or whose key is not a string,
/// are skipped with a diagnostic (or fail the batch under `Reject`).
pub fn decode_entries(
    fragment: &str,
    value: Value,
    policy: DuplicateKeyPolicy,
) -> Result<(Batch<Payload>, Vec<Diagnostic>)> {
    let Value::Array(items) = value else {
        return Err(IngestionError::decode(
            fragment,
            format!("expected an array of entries, found {}", kind(&value)),
        ));
    };

    let mut builder = BatchBuilder::new(fragment, policy);
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Array(pair) if pair.len() == 2 => {
                let mut pair = pair.into_iter();
                match (pair.next(), pair.next()) {
                    (Some(Value::String(key)), Some(payload)) => builder.insert(key, payload)?,
                    (Some(other), _) => {
                        builder.skip(index, format!("key is {}, not a string", kind(&other)))?
                    }
                    _ => builder.skip(index, "entry is not a [key, payload] pair")?,
                }
            }
            other => builder.skip(
                index,
                format!("entry is {}, not a [key, payload] pair", kind(&other)),
            )?,
        }
    }

    Ok(builder.finish())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DiagnosticKind, RegistryError};
    use serde_json::json;

    #[test]
    fn test_decode_pairs_in_order() {
        let value = json!([["b", []], ["a", [{"text": "impl Copy"}]]]);
        let (batch, diagnostics) =
            decode_entries("frag", value, DuplicateKeyPolicy::LastWriteWins).unwrap();

        assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(batch.get("a"), Some(&json!([{"text": "impl Copy"}])));
        assert_eq!(batch.origin(), Some("frag"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_non_string_key_skipped() {
        let value = json!([[1, []], ["ok", []], "junk"]);
        let (batch, diagnostics) =
            decode_entries("frag", value, DuplicateKeyPolicy::LastWriteWins).unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::SkippedEntry { index: 0, .. }
        ));
        assert!(diagnostics[1].to_string().contains("entry #2"));
    }

    #[test]
    fn test_duplicate_key_rejected_under_reject_policy() {
        let value = json!([["a", 1], ["a", 2]]);
        let err = decode_entries("frag", value, DuplicateKeyPolicy::Reject).unwrap_err();
        assert!(matches!(
            err,
            IngestionError::Batch(RegistryError::MalformedBatch { .. })
        ));
    }

    #[test]
    fn test_not_an_array() {
        let err =
            decode_entries("frag", json!({"a": []}), DuplicateKeyPolicy::LastWriteWins).unwrap_err();
        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn test_empty_array_is_empty_batch() {
        let (batch, diagnostics) =
            decode_entries("frag", json!([]), DuplicateKeyPolicy::Reject).unwrap();
        assert!(batch.is_empty());
        assert!(diagnostics.is_empty());
    }
}
