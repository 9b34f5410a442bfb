//! Azure CLI adapter for the `CloudInspector` port.
//!
//! Queries run `az ... show --output json` through a `CommandRunner`.
//! A "not found" response maps to `false`; any other failure is an error.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::{CloudInspector, CommandRunner};
use crate::domain::{ImageReference, VmDescriptor};

/// stderr fragments `az` prints when a resource or its group does not exist.
const NOT_FOUND_MARKERS: &[&str] = &["ResourceNotFound", "ResourceGroupNotFound", "was not found"];

/// Runs the `az` binary to inspect live Azure resources.
pub struct AzureCliInspector<R: CommandRunner> {
    runner: R,
    az_bin: String,
}

impl<R: CommandRunner> AzureCliInspector<R> {
    pub fn new(runner: R, az_bin: impl Into<String>) -> Self {
        Self {
            runner,
            az_bin: az_bin.into(),
        }
    }

    /// Run an `az ... show` command.
    ///
    /// Returns `Ok(None)` when the resource does not exist.
    async fn show(&self, args: &[&str]) -> Result<Option<Vec<u8>>> {
        let output = self
            .runner
            .run(&self.az_bin, args)
            .await
            .with_context(|| format!("failed to run az {}", args.join(" ")))?;
        if output.status.success() {
            return Ok(Some(output.stdout));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m)) {
            debug!(?args, "az resource not found");
            return Ok(None);
        }
        anyhow::bail!(
            "az {} exited with {}: {}",
            args.join(" "),
            output.status,
            stderr.trim()
        )
    }
}

impl<R: CommandRunner> CloudInspector for AzureCliInspector<R> {
    async fn virtual_machine_exists(
        &self,
        name: &str,
        resource_group: &str,
        subscription: &str,
    ) -> Result<bool> {
        let found = self
            .show(&vm_show_args(name, resource_group, subscription))
            .await?;
        Ok(found.is_some())
    }

    async fn network_interface_exists(
        &self,
        name: &str,
        resource_group: &str,
        subscription: &str,
    ) -> Result<bool> {
        let found = self
            .show(&[
                "network",
                "nic",
                "show",
                "--name",
                name,
                "--resource-group",
                resource_group,
                "--subscription",
                subscription,
                "--output",
                "json",
            ])
            .await?;
        Ok(found.is_some())
    }

    async fn get_virtual_machine(
        &self,
        name: &str,
        resource_group: &str,
        subscription: &str,
    ) -> Result<VmDescriptor> {
        let stdout = self
            .show(&vm_show_args(name, resource_group, subscription))
            .await?
            .with_context(|| {
                format!("virtual machine {name} not found in resource group {resource_group}")
            })?;
        parse_vm(&stdout)
    }
}

fn vm_show_args<'a>(name: &'a str, resource_group: &'a str, subscription: &'a str) -> [&'a str; 11] {
    [
        "vm",
        "show",
        "--name",
        name,
        "--resource-group",
        resource_group,
        "--subscription",
        subscription,
        "--output",
        "json",
        "--only-show-errors",
    ]
}

// ── `az vm show` JSON ────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVm {
    id: Option<String>,
    name: Option<String>,
    network_profile: Option<RawNetworkProfile>,
    storage_profile: Option<RawStorageProfile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNetworkProfile {
    network_interfaces: Option<Vec<RawNicRef>>,
}

#[derive(Deserialize)]
struct RawNicRef {
    id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStorageProfile {
    image_reference: Option<RawImageReference>,
}

#[derive(Deserialize)]
struct RawImageReference {
    publisher: Option<String>,
    offer: Option<String>,
    sku: Option<String>,
    version: Option<String>,
}

/// Parse `az vm show` JSON into a `VmDescriptor`.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or the VM has no
/// `networkProfile.networkInterfaces` list.
pub fn parse_vm(stdout: &[u8]) -> Result<VmDescriptor> {
    let raw: RawVm = serde_json::from_slice(stdout).context("parsing az vm show output")?;
    let interfaces = raw
        .network_profile
        .and_then(|p| p.network_interfaces)
        .context("VM networkProfile.networkInterfaces is missing")?;
    let image = raw
        .storage_profile
        .and_then(|p| p.image_reference)
        .map(|i| ImageReference {
            publisher: i.publisher,
            offer: i.offer,
            sku: i.sku,
            version: i.version,
        })
        .unwrap_or_default();
    Ok(VmDescriptor {
        id: raw.id,
        name: raw.name,
        network_interface_ids: interfaces.into_iter().filter_map(|n| n.id).collect(),
        image_reference: image,
    })
}
