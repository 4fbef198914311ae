//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Doc Registry - deferred registration of documentation type implementations
#[derive(Parser, Debug)]
#[command(
    name = "doc-registry",
    author,
    version,
    about = "Deferred registry for documentation type-implementation fragments",
    long_about = "Loads type-implementation fragments, registers each one as a batch, \n\
                  and hands them to the documentation index once it attaches.\n\n\
                  Fragments that arrive before the index are buffered in order and \n\
                  flushed on attach; fragments after it are forwarded directly."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DOC_REGISTRY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DOC_REGISTRY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load fragments, register them and attach the index
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Decode fragment files and list their entries without registering
    Inspect(InspectArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "DOC_REGISTRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the fragments directory from configuration
    #[arg(short, long, env = "DOC_REGISTRY_FRAGMENTS")]
    pub fragments: Option<PathBuf>,

    /// Attach the index after this many fragments were submitted
    #[arg(long, env = "DOC_REGISTRY_ATTACH_AFTER")]
    pub attach_after: Option<usize>,

    /// Fail a fragment on duplicate keys or malformed entries
    #[arg(long)]
    pub strict: bool,

    /// Validate configuration and list fragments without loading them
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "DOC_REGISTRY_METRICS_PORT")]
    pub metrics_port: u16,

    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sink parameters
    #[arg(long)]
    pub sinks: bool,
}

/// Arguments for the `inspect` command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Fragment files (`.js` or `.json`)
    #[arg(required = true)]
    pub fragments: Vec<PathBuf>,

    /// Fail on duplicate keys or malformed entries
    #[arg(long)]
    pub strict: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::parse_from([
            "doc-registry",
            "-v",
            "run",
            "--fragments",
            "target/doc/type.impl",
            "--attach-after",
            "3",
            "--json",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.fragments, Some(PathBuf::from("target/doc/type.impl")));
                assert_eq!(args.attach_after, Some(3));
                assert!(args.json);
                assert!(!args.strict);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_inspect_requires_fragments() {
        assert!(Cli::try_parse_from(["doc-registry", "inspect"]).is_err());
    }
}
