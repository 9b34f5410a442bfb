//! Loading harness configuration from disk.

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::config::HarnessConfig;
use crate::domain::error::ConfigError;

/// Load configuration from an optional YAML file.
///
/// Without a path the built-in defaults are returned.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load(path: Option<&Path>) -> Result<HarnessConfig> {
    let Some(path) = path else {
        return Ok(HarnessConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

/// Check that the Terraform directory exists.
///
/// # Errors
///
/// Returns `ConfigError::InvalidDirectory` otherwise.
pub fn check_terraform_dir(config: &HarnessConfig) -> Result<(), ConfigError> {
    if config.terraform_dir.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::InvalidDirectory(
            config.terraform_dir.display().to_string(),
        ))
    }
}
