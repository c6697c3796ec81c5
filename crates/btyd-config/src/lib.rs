//! BTYD configuration loading and validation.
//!
//! This crate provides:
//! - Hyperprior values for model priors, with BG/NBD defaults
//! - Sampler settings for the inference engine
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation

pub mod hyperpriors;
pub mod resolve;
pub mod sampler;
pub mod validate;

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use hyperpriors::HyperpriorConfig;
pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use sampler::SamplerConfig;
pub use validate::{validate_hyperpriors, validate_sampler, ValidationError, ValidationResult};

/// Complete configuration file contents.
///
/// Hyperpriors given in a file are layered over the BG/NBD defaults, so a
/// file may override a single value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BtydConfig {
    #[serde(default)]
    pub hyperpriors: HyperpriorConfig,

    #[serde(default)]
    pub sampler: SamplerConfig,
}

impl BtydConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> ValidationResult<Self> {
        let mut config: BtydConfig = serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))?;
        config.hyperpriors = config
            .hyperpriors
            .merged_over(&HyperpriorConfig::beta_geo_default());
        Ok(config)
    }

    /// Run every semantic check.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_hyperpriors(&self.hyperpriors)?;
        validate_sampler(&self.sampler)
    }
}

/// A validated configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: BtydConfig,
    pub source: ConfigSource,
    pub path: Option<String>,
    /// SHA-256 of the file content (None for built-in defaults).
    pub hash: Option<String>,
}

/// Resolve, read and validate the configuration.
pub fn load_config(cli_path: Option<&Path>) -> ValidationResult<LoadedConfig> {
    let resolved = resolve_config(cli_path);

    match resolved.path {
        Some(path) => {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let config = BtydConfig::from_json_str(&content)?;
            config.validate()?;

            Ok(LoadedConfig {
                config,
                source: resolved.source,
                path: Some(path.to_string_lossy().to_string()),
                hash: Some(compute_sha256(&content)),
            })
        }
        None => Ok(LoadedConfig {
            config: BtydConfig::default(),
            source: ConfigSource::BuiltinDefault,
            path: None,
            hash: None,
        }),
    }
}

/// Hex SHA-256 of a string.
pub fn compute_sha256(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
