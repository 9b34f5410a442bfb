//! Contracts between the harness services and the outside world.
//!
//! Provisioning, cloud queries, process execution and progress output are
//! all reached through these traits, so services run against mocks in
//! tests. This file imports only from `crate::domain`, never from `crate::infra`
//! or `crate::output`.
//!
//! Async methods are declared as `fn ... -> impl Future + Send` so that
//! callers can move the work onto spawned tokio tasks. Implementations may
//! still be written as plain `async fn`.

use std::future::Future;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{ProvisionedOutputs, ProvisioningConfig, ProvisioningHandle, VmDescriptor};

// ── Processes ────────────────────────────────────────────────────────────────

/// Runs external tools (`terraform`, `az`) and captures their output.
pub trait CommandRunner: Send + Sync + 'static {
    /// Run a program with the runner's default timeout and capture its output.
    fn run(&self, program: &str, args: &[&str]) -> impl Future<Output = Result<Output>> + Send;

    /// Run a program with an explicit deadline.
    ///
    /// A non-zero exit status is not an error; callers inspect `Output`.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or misses the
    /// deadline, in which case it has been killed.
    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> impl Future<Output = Result<Output>> + Send;
}

// ── Provisioning ──────────────────────────────────────────────────────────────

/// The result of a successful apply.
#[derive(Debug)]
pub struct Applied {
    /// Required to destroy what was applied.
    pub handle: ProvisioningHandle,
    pub outputs: ProvisionedOutputs,
}

/// Create-or-update and destroy of an infrastructure configuration.
///
/// Apply with an identical config must not duplicate resources, and
/// `destroy` must be the inverse of `apply`.
pub trait ProvisioningProvider: Send + Sync + 'static {
    /// Apply `config` and collect every output.
    fn apply(&self, config: &ProvisioningConfig)
    -> impl Future<Output = Result<Applied>> + Send;

    /// Read a single named output of an applied configuration.
    fn output(
        &self,
        handle: &ProvisioningHandle,
        name: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Destroy everything `handle` refers to.
    fn destroy(&self, handle: &ProvisioningHandle) -> impl Future<Output = Result<()>> + Send;
}

// ── Cloud state ───────────────────────────────────────────────────────────────

/// Read-only queries against live cloud state.
pub trait CloudInspector: Send + Sync + 'static {
    fn virtual_machine_exists(
        &self,
        name: &str,
        resource_group: &str,
        subscription: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn network_interface_exists(
        &self,
        name: &str,
        resource_group: &str,
        subscription: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn get_virtual_machine(
        &self,
        name: &str,
        resource_group: &str,
        subscription: &str,
    ) -> impl Future<Output = Result<VmDescriptor>> + Send;
}

// ── Progress ─────────────────────────────────────────────────────────────────

/// Human-facing progress events. Implementations must not block.
pub trait ProgressReporter: Send + Sync {
    fn step(&self, message: &str);
    /// A scenario passed or a phase completed.
    fn success(&self, message: &str);
    /// A scenario did not pass, or teardown failed.
    fn warn(&self, message: &str);
}
