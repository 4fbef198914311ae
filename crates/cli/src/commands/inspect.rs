//! `inspect` command implementation.

use anyhow::{Context, Result};
use contracts::DuplicateKeyPolicy;
use ingestion::{Fragment, FragmentLoader};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::InspectArgs;

#[derive(Serialize)]
struct FragmentInfo {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    keys: Vec<String>,
    diagnostics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl FragmentInfo {
    fn loaded(path: String, fragment: &Fragment) -> Self {
        Self {
            path,
            name: Some(fragment.name.clone()),
            format: Some(fragment.format.as_str()),
            keys: fragment.batch.keys().map(str::to_owned).collect(),
            diagnostics: fragment.diagnostics.iter().map(|d| d.to_string()).collect(),
            error: None,
        }
    }

    fn failed(path: String, error: String) -> Self {
        Self {
            path,
            name: None,
            format: None,
            keys: Vec::new(),
            diagnostics: Vec::new(),
            error: Some(error),
        }
    }
}

/// Execute the `inspect` command
pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let policy = if args.strict {
        DuplicateKeyPolicy::Reject
    } else {
        DuplicateKeyPolicy::LastWriteWins
    };
    let loader = FragmentLoader::new(policy);
    info!(fragments = args.fragments.len(), ?policy, "Inspecting fragments");

    let infos: Vec<FragmentInfo> = args
        .fragments
        .iter()
        .map(|path| {
            let path_str = path.display().to_string();
            match loader.load_path(path) {
                Ok(fragment) => FragmentInfo::loaded(path_str, &fragment),
                Err(e) => {
                    warn!(path = %path_str, error = %e, "Fragment could not be decoded");
                    FragmentInfo::failed(path_str, e.to_string())
                }
            }
        })
        .collect();

    if args.json {
        let json =
            serde_json::to_string_pretty(&infos).context("Failed to serialize fragment info")?;
        println!("{}", json);
    } else {
        print_fragments(&infos);
    }

    let failed = infos.iter().filter(|i| i.error.is_some()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} fragments failed to decode", failed, infos.len());
    }
    Ok(())
}

fn print_fragments(infos: &[FragmentInfo]) {
    for info in infos {
        match &info.error {
            Some(error) => {
                println!("✗ {}", info.path);
                println!("   └─ Error: {}", error);
            }
            None => {
                println!(
                    "✓ {} ({}, {} keys)",
                    info.path,
                    info.format.unwrap_or("?"),
                    info.keys.len()
                );
                for key in &info.keys {
                    println!("   ├─ {}", key);
                }
                for diagnostic in &info.diagnostics {
                    println!("   ⚠ {}", diagnostic);
                }
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn args(fragments: Vec<PathBuf>, strict: bool) -> InspectArgs {
        InspectArgs {
            fragments,
            strict,
            json: true,
        }
    }

    #[test]
    fn test_inspect_valid_fragment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("type.c_int.json");
        fs::write(&path, r#"[["libc",[]],["libc",[]]]"#).unwrap();

        assert!(run_inspect(&args(vec![path.clone()], false)).is_ok());
        // duplicate key becomes fatal under --strict
        assert!(run_inspect(&args(vec![path], true)).is_err());
    }

    #[test]
    fn test_inspect_reports_failures() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.json");
        fs::write(&good, "[]").unwrap();

        let result = run_inspect(&args(vec![good, dir.path().join("missing.json")], false));
        assert!(result.unwrap_err().to_string().contains("1 of 2"));
    }
}
