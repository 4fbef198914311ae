//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `RegistryBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Sinks: {}", blueprint.sinks.len());
//! ```

mod parser;
mod validator;

pub use contracts::RegistryBlueprint;
pub use parser::ConfigFormat;

use contracts::{ConfigVersion, RegistryError, RegistrySettings, SinkConfig, SinkType};
use std::path::Path;

/// Name of the sink in the built-in configuration
pub const DEFAULT_SINK_NAME: &str = "index";

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<RegistryBlueprint, RegistryError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<RegistryBlueprint, RegistryError> {
        Self::parse_and_validate(content, format)
    }

    /// Load from `path` when given, otherwise fall back to [`Self::default_blueprint`]
    pub fn load_or_default(path: Option<&Path>) -> Result<RegistryBlueprint, RegistryError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Ok(Self::default_blueprint()),
        }
    }

    /// Built-in configuration: a single in-memory index sink, lenient duplicates
    pub fn default_blueprint() -> RegistryBlueprint {
        RegistryBlueprint {
            version: ConfigVersion::V1,
            registry: RegistrySettings::default(),
            sinks: vec![SinkConfig {
                name: DEFAULT_SINK_NAME.to_string(),
                sink_type: SinkType::Index,
                params: Default::default(),
            }],
        }
    }

    /// Serialize RegistryBlueprint to TOML string
    pub fn to_toml(blueprint: &RegistryBlueprint) -> Result<String, RegistryError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| RegistryError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize RegistryBlueprint to JSON string
    pub fn to_json(blueprint: &RegistryBlueprint) -> Result<String, RegistryError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| RegistryError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, RegistryError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            RegistryError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            RegistryError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, RegistryError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<RegistryBlueprint, RegistryError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::DuplicateKeyPolicy;

    const MINIMAL_TOML: &str = r#"
[registry]
duplicate_keys = "last_write_wins"
fragments_dir = "target/doc/type.impl"

[[sinks]]
name = "index"
sink_type = "index"

[[sinks]]
name = "log_sink"
sink_type = "log"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.sinks.len(), 2);
        assert_eq!(bp.registry.duplicate_keys, DuplicateKeyPolicy::LastWriteWins);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.sinks.len(), bp2.sinks.len());
        assert_eq!(bp.sinks[0].name, bp2.sinks[0].name);
        assert_eq!(bp.registry.fragments_dir, bp2.registry.fragments_dir);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.sinks[1].name, bp2.sinks[1].name);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        // Duplicate sink name should fail validation
        let content = r#"
[[sinks]]
name = "index"
sink_type = "index"

[[sinks]]
name = "index"
sink_type = "log"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_default_blueprint_is_valid() {
        let bp = ConfigLoader::load_or_default(None).unwrap();
        assert_eq!(bp.sinks.len(), 1);
        assert_eq!(bp.sinks[0].name, DEFAULT_SINK_NAME);
        assert!(validator::validate(&bp).is_ok());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::load_from_path(Path::new("config.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
