//! Verification scenarios and the context they share.
//!
//! Imports only from `crate::domain` and `crate::application`.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::application::ports::{CloudInspector, ProvisioningProvider};
use crate::application::services::setup::SetupCoordinator;
use crate::domain::provisioning::{OUTPUT_NIC_NAME, OUTPUT_RESOURCE_GROUP, OUTPUT_VM_NAME};
use crate::domain::vm::{compare_image, is_nic_attached, nic_resource_id};
use crate::domain::{
    Checks, ExpectedImage, HarnessError, ProvisioningConfig, ProvisioningHandle, Scenario,
    ScenarioOutcome, ScenarioReport, SetupError,
};

/// Everything scenarios need, built once per run and shared by reference.
pub struct SuiteContext<P: ProvisioningProvider, I: CloudInspector> {
    pub provider: Arc<P>,
    pub inspector: Arc<I>,
    /// Shared one-time setup.
    pub setup: SetupCoordinator<P>,
    /// Configuration applied by both the shared setup and scoped scenarios.
    pub config: ProvisioningConfig,
    pub subscription: String,
    pub expected_image: ExpectedImage,
}

impl<P: ProvisioningProvider, I: CloudInspector> SuiteContext<P, I> {
    #[must_use]
    pub fn new(
        provider: Arc<P>,
        inspector: Arc<I>,
        config: ProvisioningConfig,
        subscription: impl Into<String>,
        expected_image: ExpectedImage,
    ) -> Self {
        let setup = SetupCoordinator::new(Arc::clone(&provider), config.clone());
        Self {
            provider,
            inspector,
            setup,
            config,
            subscription: subscription.into(),
            expected_image,
        }
    }
}

/// Run one scenario to completion and time it.
pub async fn run_scenario<P, I>(scenario: Scenario, ctx: &SuiteContext<P, I>) -> ScenarioReport
where
    P: ProvisioningProvider,
    I: CloudInspector,
{
    info!(scenario = %scenario, strategy = ?scenario.strategy(), "=== RUN");
    let started = Instant::now();

    let result = match scenario {
        Scenario::VmCreation => vm_creation(ctx).await,
        Scenario::NicExistsAndAttached => nic_exists_and_attached(ctx).await,
        Scenario::UbuntuImage => ubuntu_image(ctx).await,
    };

    let outcome = match result {
        Ok(checks) => checks.into_outcome(),
        Err(err) => {
            error!(scenario = %scenario, error = %err, "scenario stopped");
            ScenarioOutcome::Errored(err)
        }
    };
    let report = ScenarioReport {
        name: scenario.name().to_string(),
        outcome,
        duration: started.elapsed(),
    };
    info!(scenario = %scenario, result = report.outcome.label(), "=== DONE");
    report
}

// ── Scoped provisioning ──────────────────────────────────────────────────────

/// Apply a private copy of the configuration, check the VM exists, destroy.
///
/// The destroy runs on every return path once apply has been attempted,
/// since a failed apply can leave resources behind.
async fn vm_creation<P, I>(ctx: &SuiteContext<P, I>) -> Result<Checks, HarnessError>
where
    P: ProvisioningProvider,
    I: CloudInspector,
{
    let handle = ProvisioningHandle::new(ctx.config.clone());

    let result = async {
        ctx.provider
            .apply(&ctx.config)
            .await
            .map_err(|e| SetupError::ApplyFailed(format!("{e:#}")))?;

        let vm_name = ctx
            .provider
            .output(&handle, OUTPUT_VM_NAME)
            .await
            .map_err(|_| SetupError::MissingOutput(OUTPUT_VM_NAME.to_string()))?;
        let resource_group = ctx
            .provider
            .output(&handle, OUTPUT_RESOURCE_GROUP)
            .await
            .map_err(|_| SetupError::MissingOutput(OUTPUT_RESOURCE_GROUP.to_string()))?;

        let exists = ctx
            .inspector
            .virtual_machine_exists(&vm_name, &resource_group, &ctx.subscription)
            .await
            .map_err(|e| HarnessError::inspection("virtual_machine_exists", &e))?;

        let mut checks = Checks::new();
        checks.check(
            exists,
            format!("VM {vm_name} does not exist in resource group {resource_group}"),
        );
        Ok::<_, HarnessError>(checks)
    }
    .await;

    let destroyed = ctx.provider.destroy(&handle).await;

    match (result, destroyed) {
        (Ok(checks), Ok(())) => Ok(checks),
        (Ok(checks), Err(e)) => {
            for failure in checks.failures() {
                warn!(scenario = "vm_creation", %failure, "assertion failed before teardown error");
            }
            Err(HarnessError::Teardown(format!("{e:#}")))
        }
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(e)) => {
            error!(error = %format!("{e:#}"), "scoped destroy failed after scenario error");
            Err(HarnessError::Teardown(format!("{e:#} (after {err})")))
        }
    }
}

// ── Shared provisioning ──────────────────────────────────────────────────────

/// The NIC exists and its resource id is among the VM's interfaces.
async fn nic_exists_and_attached<P, I>(ctx: &SuiteContext<P, I>) -> Result<Checks, HarnessError>
where
    P: ProvisioningProvider,
    I: CloudInspector,
{
    let outputs = ctx.setup.ensure_provisioned().await?;
    let vm_name = outputs.require(OUTPUT_VM_NAME)?;
    let resource_group = outputs.require(OUTPUT_RESOURCE_GROUP)?;
    let nic_name = outputs.require(OUTPUT_NIC_NAME)?;

    let mut checks = Checks::new();

    let nic_exists = ctx
        .inspector
        .network_interface_exists(nic_name, resource_group, &ctx.subscription)
        .await
        .map_err(|e| HarnessError::inspection("network_interface_exists", &e))?;
    checks.check(nic_exists, format!("NIC {nic_name} does not exist"));

    let vm = ctx
        .inspector
        .get_virtual_machine(vm_name, resource_group, &ctx.subscription)
        .await
        .map_err(|e| HarnessError::inspection("get_virtual_machine", &e))?;

    let expected_id = nic_resource_id(&ctx.subscription, resource_group, nic_name);
    checks.check(
        is_nic_attached(&vm.network_interface_ids, &expected_id),
        format!(
            "NIC is not attached to VM: {expected_id} not in [{}]",
            vm.network_interface_ids.join(", ")
        ),
    );
    Ok(checks)
}

/// The VM image publisher, offer and sku match the expected image.
async fn ubuntu_image<P, I>(ctx: &SuiteContext<P, I>) -> Result<Checks, HarnessError>
where
    P: ProvisioningProvider,
    I: CloudInspector,
{
    let outputs = ctx.setup.ensure_provisioned().await?;
    let vm_name = outputs.require(OUTPUT_VM_NAME)?;
    let resource_group = outputs.require(OUTPUT_RESOURCE_GROUP)?;

    let vm = ctx
        .inspector
        .get_virtual_machine(vm_name, resource_group, &ctx.subscription)
        .await
        .map_err(|e| HarnessError::inspection("get_virtual_machine", &e))?;

    let mut checks = Checks::new();
    for mismatch in compare_image(&vm.image_reference, &ctx.expected_image) {
        checks.fail(mismatch.to_string());
    }
    Ok(checks)
}
