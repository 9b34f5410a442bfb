//! Domain types and validators for harness configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.
//! Loading from YAML and the environment lives in `crate::infra::config`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::provisioning::{LABEL_PREFIX_VAR, ProvisioningConfig};
use crate::domain::vm::{ExpectedImage, UBUNTU_JAMMY_OFFER, UBUNTU_JAMMY_SKU, UBUNTU_PUBLISHER};

// ── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_TERRAFORM_DIR: &str = "..";
pub const DEFAULT_LABEL_PREFIX: &str = "vmprobe";
pub const DEFAULT_APPLY_TIMEOUT_SECS: u64 = 30 * 60;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 5 * 60;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

// ── Config schema ────────────────────────────────────────────────────────────

/// Harness configuration, optionally stored in a YAML file.
///
/// Every field has a default except `subscription_id`, which must come from
/// the file, `AZURE_SUBSCRIPTION_ID`, or `--subscription-id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory holding the Terraform definitions.
    pub terraform_dir: PathBuf,
    /// Value for the `labelPrefix` Terraform variable.
    pub label_prefix: String,
    /// Azure subscription the resources live in.
    pub subscription_id: Option<String>,
    /// Directory the `test_<timestamp>.log` file is written to.
    pub log_dir: PathBuf,
    /// Additional Terraform variables. `labelPrefix` here is ignored.
    pub extra_vars: BTreeMap<String, String>,
    /// Image the VM is expected to run.
    pub expected_image: ImageConfig,
    pub terraform: ToolConfig,
    /// Path or name of the Azure CLI binary.
    pub az_bin: String,
}

/// Terraform invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Path or name of the terraform binary.
    pub bin: String,
    /// Timeout for `apply` and `destroy`, in seconds.
    pub apply_timeout_secs: u64,
    /// Timeout for `init`, `output` and cloud queries, in seconds.
    pub command_timeout_secs: u64,
    /// Attempts after the first for transient failures.
    pub max_retries: u32,
    /// Pause between retries, in seconds.
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            terraform_dir: PathBuf::from(DEFAULT_TERRAFORM_DIR),
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            subscription_id: None,
            log_dir: PathBuf::from("."),
            extra_vars: BTreeMap::new(),
            expected_image: ImageConfig::default(),
            terraform: ToolConfig::default(),
            az_bin: "az".to_string(),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            bin: "terraform".to_string(),
            apply_timeout_secs: DEFAULT_APPLY_TIMEOUT_SECS,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            publisher: UBUNTU_PUBLISHER.to_string(),
            offer: UBUNTU_JAMMY_OFFER.to_string(),
            sku: UBUNTU_JAMMY_SKU.to_string(),
        }
    }
}

impl ToolConfig {
    #[must_use]
    pub fn apply_timeout(&self) -> Duration {
        Duration::from_secs(self.apply_timeout_secs)
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl HarnessConfig {
    /// Terraform variables: `extra_vars` plus `labelPrefix`, which always wins.
    #[must_use]
    pub fn provisioning_config(&self) -> ProvisioningConfig {
        let mut vars = self.extra_vars.clone();
        vars.insert(LABEL_PREFIX_VAR.to_string(), self.label_prefix.clone());
        ProvisioningConfig::new(self.terraform_dir.clone(), vars)
    }

    #[must_use]
    pub fn expected_image(&self) -> ExpectedImage {
        ExpectedImage {
            publisher: self.expected_image.publisher.clone(),
            offer: self.expected_image.offer.clone(),
            sku: self.expected_image.sku.clone(),
        }
    }

    /// The validated subscription id.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingSubscription` when unset and
    /// `ConfigError::InvalidSubscription` when it is not GUID-shaped.
    pub fn subscription(&self) -> Result<&str, ConfigError> {
        let sub = self
            .subscription_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSubscription)?;
        validate_subscription_id(sub)?;
        Ok(sub)
    }

    /// Validate everything that does not touch the filesystem.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.label_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyLabelPrefix);
        }
        self.subscription()?;
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates that `id` has the 8-4-4-4-12 hex shape of an Azure subscription id.
///
/// # Errors
///
/// Returns `ConfigError::InvalidSubscription` otherwise.
pub fn validate_subscription_id(id: &str) -> Result<(), ConfigError> {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
    let parts: Vec<&str> = id.split('-').collect();
    let valid = parts.len() == GROUPS.len()
        && parts
            .iter()
            .zip(GROUPS)
            .all(|(part, len)| part.len() == len && part.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidSubscription(id.to_string()))
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
