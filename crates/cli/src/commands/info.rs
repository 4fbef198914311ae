//! `info` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use contracts::RegistryBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    registry: RegistryInfo,
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct RegistryInfo {
    duplicate_keys: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fragments_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attach_after: Option<usize>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args.sinks);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args.sinks);
    }

    Ok(())
}

fn build_config_info(blueprint: &RegistryBlueprint, with_params: bool) -> ConfigInfo {
    let sinks = blueprint
        .sinks
        .iter()
        .map(|s| SinkInfo {
            name: s.name.clone(),
            sink_type: format!("{:?}", s.sink_type),
            params: if with_params {
                s.params.clone()
            } else {
                HashMap::new()
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        registry: RegistryInfo {
            duplicate_keys: format!("{:?}", blueprint.registry.duplicate_keys),
            fragments_dir: blueprint
                .registry
                .fragments_dir
                .as_ref()
                .map(|p| p.display().to_string()),
            attach_after: blueprint.registry.attach_after,
        },
        sinks,
    }
}

fn print_config_info(blueprint: &RegistryBlueprint, with_params: bool) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Doc Registry Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let registry = &blueprint.registry;
    println!("📥 Registry");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Duplicate keys: {:?}", registry.duplicate_keys);
    match &registry.fragments_dir {
        Some(dir) => println!("   ├─ Fragments: {}", dir.display()),
        None => println!("   ├─ Fragments: (pass --fragments)"),
    }
    match registry.attach_after {
        Some(n) => println!("   └─ Attach after: {} fragments", n),
        None => println!("   └─ Attach after: all fragments"),
    }

    println!("\n📤 Sinks ({})", blueprint.sinks.len());
    for (i, sink) in blueprint.sinks.iter().enumerate() {
        let is_last = i == blueprint.sinks.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);

        if with_params && !sink.params.is_empty() {
            let mut params: Vec<_> = sink.params.iter().collect();
            params.sort();
            for (j, (key, value)) in params.iter().enumerate() {
                let param_prefix = if j == params.len() - 1 { "└─" } else { "├─" };
                println!("   {}  {} {} = {}", child_prefix, param_prefix, key, value);
            }
        }
    }

    println!();
}
