//! Provisioning inputs and outputs.
//!
//! Pure data only; the adapters that act on these live in `crate::infra`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::error::SetupError;

// ── Output names ──────────────────────────────────────────────────────────────

/// Terraform output holding the generated VM name.
pub const OUTPUT_VM_NAME: &str = "vm_name";
/// Terraform output holding the resource group name.
pub const OUTPUT_RESOURCE_GROUP: &str = "resource_group_name";
/// Terraform output holding the NIC name.
pub const OUTPUT_NIC_NAME: &str = "nic_name";

/// Outputs every shared-state scenario relies on.
pub const REQUIRED_OUTPUTS: &[&str] = &[OUTPUT_VM_NAME, OUTPUT_RESOURCE_GROUP, OUTPUT_NIC_NAME];

/// Terraform variable carrying the resource label prefix.
pub const LABEL_PREFIX_VAR: &str = "labelPrefix";

// ── ProvisioningConfig ────────────────────────────────────────────────────────

/// Infrastructure definition directory plus the variables to apply it with.
///
/// Immutable once built. Variables are kept sorted so the generated
/// `-var` arguments are deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningConfig {
    source_dir: PathBuf,
    variables: BTreeMap<String, String>,
}

impl ProvisioningConfig {
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>, variables: BTreeMap<String, String>) -> Self {
        Self {
            source_dir: source_dir.into(),
            variables,
        }
    }

    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    #[must_use]
    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    /// Render variables as `name=value` pairs, sorted by name.
    #[must_use]
    pub fn var_assignments(&self) -> Vec<String> {
        self.variables
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect()
    }
}

// ── ProvisioningHandle ────────────────────────────────────────────────────────

/// Reference to an applied configuration, required for destroy.
///
/// Not `Clone`: whoever applied owns the only handle.
#[derive(Debug, PartialEq, Eq)]
pub struct ProvisioningHandle {
    config: ProvisioningConfig,
}

impl ProvisioningHandle {
    #[must_use]
    pub fn new(config: ProvisioningConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ProvisioningConfig {
        &self.config
    }
}

// ── ProvisionedOutputs ────────────────────────────────────────────────────────

/// Named string outputs produced by a successful apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionedOutputs {
    values: BTreeMap<String, String>,
}

impl ProvisionedOutputs {
    #[must_use]
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Look up an output that must exist.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::MissingOutput` if the output was not produced.
    pub fn require(&self, name: &str) -> Result<&str, SetupError> {
        self.get(name)
            .ok_or_else(|| SetupError::MissingOutput(name.to_string()))
    }

    /// Check that every name in `names` is present.
    ///
    /// # Errors
    ///
    /// Returns the first missing output name.
    pub fn ensure_present(&self, names: &[&str]) -> Result<(), SetupError> {
        for name in names {
            self.require(name)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for ProvisionedOutputs {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
