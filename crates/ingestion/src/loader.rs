//! Fragment loading and discovery

use std::fs;
use std::path::{Path, PathBuf};

use contracts::{Batch, Diagnostic, DuplicateKeyPolicy, Payload};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::decode::decode_entries;
use crate::error::{IngestionError, Result};
use crate::format::{extract_entries, parse_trailer, FragmentFormat, FragmentTrailer};

/// One decoded fragment, ready to submit
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Path relative to the fragments root, without extension
    pub name: String,
    pub format: FragmentFormat,
    pub batch: Batch<Payload>,
    pub diagnostics: Vec<Diagnostic>,
    /// Present only for script fragments that carry one
    pub trailer: Option<FragmentTrailer>,
}

impl Fragment {
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}

/// Reads fragment files into batches
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentLoader {
    policy: DuplicateKeyPolicy,
}

impl FragmentLoader {
    pub fn new(policy: DuplicateKeyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DuplicateKeyPolicy {
        self.policy
    }

    /// Load a fragment named after its file stem
    pub fn load_path(&self, path: &Path) -> Result<Fragment> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.load_named(name, path)
    }

    /// Load a fragment named after its path relative to `root`
    pub fn load_in(&self, root: &Path, path: &Path) -> Result<Fragment> {
        self.load_named(fragment_name(root, path), path)
    }

    #[instrument(name = "fragment_load", skip_all, fields(fragment = %name))]
    fn load_named(&self, name: String, path: &Path) -> Result<Fragment> {
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(FragmentFormat::from_extension)
            .ok_or_else(|| IngestionError::UnsupportedFormat {
                path: path.to_path_buf(),
            })?;

        let content = fs::read_to_string(path).map_err(|source| IngestionError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.load_str(name, &content, format)
    }

    /// Decode fragment content already in memory
    pub fn load_str(
        &self,
        name: impl Into<String>,
        content: &str,
        format: FragmentFormat,
    ) -> Result<Fragment> {
        let name = name.into();
        let value = extract_entries(&name, content, format)?;
        let (batch, diagnostics) = decode_entries(&name, value, self.policy)?;

        let trailer = match format {
            FragmentFormat::Script => parse_trailer(content),
            FragmentFormat::Json => None,
        };

        for diagnostic in &diagnostics {
            warn!(%diagnostic, "Fragment diagnostic");
        }
        metrics::counter!("doc_registry_fragments_loaded_total", "format" => format.as_str())
            .increment(1);
        debug!(
            fragment = %name,
            format = format.as_str(),
            entries = batch.len(),
            diagnostics = diagnostics.len(),
            "Fragment loaded"
        );

        Ok(Fragment {
            name,
            format,
            batch,
            diagnostics,
            trailer,
        })
    }
}

/// Every fragment file under `root`, recursively, in sorted path order
///
/// Symbolic links are not followed, so a link back into the tree cannot
/// yield the same fragment twice.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| IngestionError::Io {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && is_fragment(entry.path()) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

fn is_fragment(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(FragmentFormat::from_extension)
        .is_some()
}

/// `root/std/os/raw/type.c_int.js` -> `std/os/raw/type.c_int`
pub fn fragment_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let stem = relative.with_extension("");
    stem.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::RegistryError;
    use serde_json::json;
    use tempfile::tempdir;

    const SCRIPT: &str = r#"(function() {
    var type_impls = Object.fromEntries([["libc",[]],["nix_bindings_util_sys",[]]]);
    if (window.register_type_impls) {
        window.register_type_impls(type_impls);
    } else {
        window.pending_type_impls = type_impls;
    }
})()
//{"start":55,"fragment_lengths":[12,33]}"#;

    #[test]
    fn test_load_str_script() {
        let loader = FragmentLoader::default();
        let fragment = loader
            .load_str("type.c_int", SCRIPT, FragmentFormat::Script)
            .unwrap();

        assert_eq!(fragment.name, "type.c_int");
        assert_eq!(
            fragment.batch.keys().collect::<Vec<_>>(),
            vec!["libc", "nix_bindings_util_sys"]
        );
        assert_eq!(fragment.batch.origin(), Some("type.c_int"));
        assert_eq!(
            fragment.trailer.as_ref().map(|t| t.fragment_lengths.clone()),
            Some(vec![12, 33])
        );
    }

    #[test]
    fn test_load_path_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trait.Send.json");
        fs::write(&path, json!([["core", []]]).to_string()).unwrap();

        let fragment = FragmentLoader::default().load_path(&path).unwrap();
        assert_eq!(fragment.name, "trait.Send");
        assert_eq!(fragment.format, FragmentFormat::Json);
        assert_eq!(fragment.len(), 1);
        assert!(fragment.trailer.is_none());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "[]").unwrap();

        let err = FragmentLoader::default().load_path(&path).unwrap_err();
        assert!(matches!(err, IngestionError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = FragmentLoader::default()
            .load_path(&dir.path().join("gone.json"))
            .unwrap_err();
        assert!(matches!(err, IngestionError::Io { .. }));
        assert!(matches!(RegistryError::from(err), RegistryError::Io(_)));
    }

    #[test]
    fn test_reject_policy_fails_on_duplicates() {
        let loader = FragmentLoader::new(DuplicateKeyPolicy::Reject);
        let err = loader
            .load_str("dup", r#"[["a",[]],["a",[]]]"#, FragmentFormat::Json)
            .unwrap_err();
        assert!(matches!(
            RegistryError::from(err),
            RegistryError::MalformedBatch { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_ignores_symlink_cycles() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("std");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("type.c_int.json"), "[]").unwrap();
        std::os::unix::fs::symlink(dir.path(), nested.join("up")).unwrap();

        let found = discover(dir.path()).unwrap();
        assert_eq!(found, vec![nested.join("type.c_int.json")]);
    }

    #[test]
    fn test_discover_missing_root_is_io_error() {
        let dir = tempdir().unwrap();
        let err = discover(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, IngestionError::Io { .. }));
    }

    #[test]
    fn test_discover_recursive_sorted() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("std").join("os");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("type.c_int.js"), SCRIPT).unwrap();
        fs::write(dir.path().join("b.json"), "[]").unwrap();
        fs::write(dir.path().join("a.json"), "[]").unwrap();
        fs::write(dir.path().join("README.md"), "skip me").unwrap();

        let found = discover(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| fragment_name(dir.path(), p))
            .collect();
        assert_eq!(names, vec!["a", "b", "std/os/type.c_int"]);

        let fragment = FragmentLoader::default()
            .load_in(dir.path(), &found[2])
            .unwrap();
        assert_eq!(fragment.name, "std/os/type.c_int");
    }
}
