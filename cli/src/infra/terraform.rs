//! Terraform CLI adapter for the `ProvisioningProvider` port.
//!
//! Every call goes through a `CommandRunner`, so tests can inject a mock
//! runner without spawning real processes. `init`, `apply` and `destroy` are
//! retried when stderr matches a known transient error.

use std::collections::HashMap;
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::RegexSet;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::application::ports::{Applied, CommandRunner, ProvisioningProvider};
use crate::domain::config::ToolConfig;
use crate::domain::{ProvisionedOutputs, ProvisioningConfig, ProvisioningHandle};

/// Error fragments that indicate a transient failure worth retrying.
///
/// Provider downloads, registry lookups and Azure throttling fail
/// intermittently; everything else is treated as permanent.
pub const RETRYABLE_ERRORS: &[&str] = &[
    r"read: connection reset by peer",
    r"transport is closing",
    r"unable to verify signature",
    r"unable to verify checksum",
    r"no provider exists with the given name",
    r"registry service is unreachable",
    r"Error installing provider",
    r"Failed to query available provider packages",
    r"timeout while waiting for plugin to start",
    r"timed out waiting for server handshake",
    r"could not query provider registry for",
    r"TLS handshake timeout",
    r"StatusCode=429",
    r"TooManyRequests",
];

/// Runs the `terraform` binary against a configuration directory.
pub struct TerraformProvider<R: CommandRunner> {
    runner: R,
    tool: ToolConfig,
    retryable: RegexSet,
}

impl<R: CommandRunner> TerraformProvider<R> {
    /// Create a provider that runs `tool.bin` through `runner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in retryable patterns fail to compile.
    pub fn new(runner: R, tool: ToolConfig) -> Result<Self> {
        let retryable =
            RegexSet::new(RETRYABLE_ERRORS).context("compiling retryable terraform errors")?;
        Ok(Self {
            runner,
            tool,
            retryable,
        })
    }

    fn is_retryable(&self, message: &str) -> bool {
        self.retryable.is_match(message)
    }

    /// Run one terraform command and fail on a non-zero exit status.
    async fn run_once(&self, args: &[&str], timeout: Duration) -> Result<Output> {
        let output = self
            .runner
            .run_with_timeout(&self.tool.bin, args, timeout)
            .await
            .with_context(|| format!("failed to run terraform {}", subcommand(args)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(
                stdout = %String::from_utf8_lossy(&output.stdout),
                %stderr,
                "terraform command failed"
            );
            anyhow::bail!(
                "terraform {} exited with {}: {}",
                subcommand(args),
                output.status,
                stderr.trim()
            );
        }
        Ok(output)
    }

    /// Run a terraform command, retrying transient failures.
    async fn run_with_retry(&self, args: &[&str], timeout: Duration) -> Result<Output> {
        let mut attempt = 0;
        loop {
            match self.run_once(args, timeout).await {
                Ok(output) => return Ok(output),
                Err(e) if attempt < self.tool.max_retries && self.is_retryable(&format!("{e:#}")) => {
                    attempt += 1;
                    warn!(
                        command = subcommand(args),
                        attempt,
                        max_retries = self.tool.max_retries,
                        error = %format!("{e:#}"),
                        "transient terraform error, retrying"
                    );
                    tokio::time::sleep(self.tool.retry_delay()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn init(&self, config: &ProvisioningConfig) -> Result<()> {
        let chdir = chdir_arg(config);
        info!(dir = %config.source_dir().display(), "terraform init");
        self.run_with_retry(
            &[&chdir, "init", "-input=false", "-no-color"],
            self.tool.command_timeout(),
        )
        .await?;
        Ok(())
    }

    async fn outputs(&self, config: &ProvisioningConfig) -> Result<ProvisionedOutputs> {
        let chdir = chdir_arg(config);
        let output = self
            .run_once(
                &[&chdir, "output", "-json", "-no-color"],
                self.tool.command_timeout(),
            )
            .await?;
        parse_outputs(&output.stdout)
    }
}

impl<R: CommandRunner> ProvisioningProvider for TerraformProvider<R> {
    async fn apply(&self, config: &ProvisioningConfig) -> Result<Applied> {
        self.init(config).await?;

        let chdir = chdir_arg(config);
        let var_args = var_args(config);
        let mut args = vec![
            chdir.as_str(),
            "apply",
            "-input=false",
            "-auto-approve",
            "-no-color",
        ];
        args.extend(var_args.iter().map(String::as_str));

        info!(dir = %config.source_dir().display(), "terraform apply");
        self.run_with_retry(&args, self.tool.apply_timeout()).await?;

        let outputs = self.outputs(config).await?;
        info!(outputs = outputs.len(), "terraform apply complete");
        Ok(Applied {
            handle: ProvisioningHandle::new(config.clone()),
            outputs,
        })
    }

    async fn output(&self, handle: &ProvisioningHandle, name: &str) -> Result<String> {
        let chdir = chdir_arg(handle.config());
        let output = self
            .run_once(
                &[&chdir, "output", "-no-color", "-raw", name],
                self.tool.command_timeout(),
            )
            .await
            .with_context(|| format!("reading terraform output '{name}'"))?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn destroy(&self, handle: &ProvisioningHandle) -> Result<()> {
        let config = handle.config();
        let chdir = chdir_arg(config);
        let var_args = var_args(config);
        let mut args = vec![
            chdir.as_str(),
            "destroy",
            "-input=false",
            "-auto-approve",
            "-no-color",
        ];
        args.extend(var_args.iter().map(String::as_str));

        info!(dir = %config.source_dir().display(), "terraform destroy");
        self.run_with_retry(&args, self.tool.apply_timeout())
            .await
            .context("terraform destroy failed")?;
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn chdir_arg(config: &ProvisioningConfig) -> String {
    format!("-chdir={}", config.source_dir().display())
}

/// `-var name=value` pairs, flattened, in sorted variable order.
fn var_args(config: &ProvisioningConfig) -> Vec<String> {
    config
        .var_assignments()
        .into_iter()
        .flat_map(|assignment| ["-var".to_string(), assignment])
        .collect()
}

/// The terraform subcommand in an argument list (skipping `-chdir=`).
fn subcommand<'a>(args: &[&'a str]) -> &'a str {
    args.iter()
        .copied()
        .find(|a| !a.starts_with('-'))
        .unwrap_or("")
}

#[derive(Deserialize)]
struct RawOutput {
    value: serde_json::Value,
}

/// Parse `terraform output -json` into name → string.
///
/// String values are taken verbatim; other JSON values are rendered as
/// compact JSON.
///
/// # Errors
///
/// Returns an error if `stdout` is not a JSON object of `{ "value": ... }`.
pub fn parse_outputs(stdout: &[u8]) -> Result<ProvisionedOutputs> {
    let raw: HashMap<String, RawOutput> =
        serde_json::from_slice(stdout).context("parsing terraform output -json")?;
    Ok(raw
        .into_iter()
        .map(|(name, out)| {
            let value = match out.value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (name, value)
        })
        .collect())
}
