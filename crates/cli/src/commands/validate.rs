//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{RegistryBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    duplicate_keys: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fragments_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attach_after: Option<usize>,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    duplicate_keys: format!("{:?}", blueprint.registry.duplicate_keys),
                    fragments_dir: blueprint
                        .registry
                        .fragments_dir
                        .as_ref()
                        .map(|p| p.display().to_string()),
                    attach_after: blueprint.registry.attach_after,
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RegistryBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if !blueprint
        .sinks
        .iter()
        .any(|s| s.sink_type == SinkType::Index)
    {
        warnings.push("No index sink configured - run report will list no keys".to_string());
    }

    match &blueprint.registry.fragments_dir {
        None => warnings.push(
            "registry.fragments_dir is not set - `run` will need --fragments".to_string(),
        ),
        Some(dir) if !dir.is_dir() => warnings.push(format!(
            "registry.fragments_dir does not exist: {}",
            dir.display()
        )),
        Some(_) => {}
    }

    if blueprint.registry.attach_after == Some(0) {
        warnings.push("registry.attach_after = 0 - every batch will be forwarded".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Duplicate keys: {}", summary.duplicate_keys);
            if let Some(ref dir) = summary.fragments_dir {
                println!("  Fragments: {}", dir);
            }
            if let Some(n) = summary.attach_after {
                println!("  Attach after: {}", n);
            }
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn validate(path: PathBuf) -> ValidationResult {
        validate_config(&ValidateArgs {
            config: path,
            json: false,
        })
    }

    #[test]
    fn test_missing_file() {
        let result = validate(PathBuf::from("/definitely/not/here.toml"));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[registry]
attach_after = 0

[[sinks]]
name = "log"
sink_type = "log"
"#,
        )
        .unwrap();

        let result = validate(path);
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 3);
        assert_eq!(result.summary.unwrap().attach_after, Some(0));
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "sinks = []\n").unwrap();

        let result = validate(path);
        assert!(!result.valid);
        assert!(result.error.is_some());
    }
}
