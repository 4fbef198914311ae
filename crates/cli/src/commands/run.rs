//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{DuplicateKeyPolicy, RegistryBlueprint};
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let mut blueprint = load_blueprint(args)?;

    // Apply CLI overrides
    if let Some(ref dir) = args.fragments {
        info!(dir = %dir.display(), "Overriding fragments directory from CLI");
        blueprint.registry.fragments_dir = Some(dir.clone());
    }
    if let Some(n) = args.attach_after {
        info!(attach_after = n, "Overriding attach point from CLI");
        blueprint.registry.attach_after = Some(n);
    }
    if args.strict {
        blueprint.registry.duplicate_keys = DuplicateKeyPolicy::Reject;
    }

    let fragments_dir = blueprint
        .registry
        .fragments_dir
        .clone()
        .ok_or(CliError::FragmentsDirMissing)?;

    info!(
        fragments_dir = %fragments_dir.display(),
        attach_after = ?blueprint.registry.attach_after,
        duplicate_keys = ?blueprint.registry.duplicate_keys,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        let fragments = ingestion::discover(&fragments_dir).map_err(CliError::from)?;
        print_config_summary(&blueprint, fragments.len());
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        attach_after: blueprint.registry.attach_after,
        blueprint,
        fragments_dir,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let stats = Pipeline::new(pipeline_config, registry::global::registry())
        .run()
        .await
        .context("Pipeline execution failed")?;

    info!(
        submitted = stats.submitted,
        load_failures = stats.load_failures,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed successfully"
    );

    if args.json {
        let json = serde_json::to_string_pretty(&stats.report(true))
            .context("Failed to serialize run report")?;
        println!("{}", json);
    } else {
        stats.print_summary();
    }

    Ok(())
}

/// Configuration from `--config`, or the built-in defaults when none is given
fn load_blueprint(args: &RunArgs) -> Result<RegistryBlueprint> {
    match args.config.as_deref() {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
        }
        None => info!("No configuration given, using built-in defaults"),
    }

    config_loader::ConfigLoader::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RegistryBlueprint, fragment_count: usize) {
    println!("\n=== Configuration Summary ===\n");
    println!("Registry:");
    if let Some(ref dir) = blueprint.registry.fragments_dir {
        println!("  Fragments: {} ({} files)", dir.display(), fragment_count);
    }
    println!("  Duplicate keys: {:?}", blueprint.registry.duplicate_keys);
    match blueprint.registry.attach_after {
        Some(n) => println!("  Attach after: {} fragments", n),
        None => println!("  Attach after: all fragments"),
    }

    println!("\nSinks ({}):", blueprint.sinks.len());
    for sink in &blueprint.sinks {
        println!("  - {} ({:?})", sink.name, sink.sink_type);
    }

    println!();
}
