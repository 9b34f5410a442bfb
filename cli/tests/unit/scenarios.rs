//! Tests for the individual verification scenarios.

#![allow(clippy::expect_used)]

use vmprobe::application::services::run_scenario;
use vmprobe::domain::vm::nic_resource_id;
use vmprobe::domain::{HarnessError, Scenario, ScenarioOutcome, SetupError};

use crate::mocks::{MockInspector, MockProvider, NIC, RG, SUB, jammy_vm, suite};

fn failure_messages(outcome: &ScenarioOutcome) -> Vec<String> {
    match outcome {
        ScenarioOutcome::Failed(failures) => failures.iter().map(|f| f.message.clone()).collect(),
        other => panic!("expected Failed, got {other:?}"),
    }
}

// ── vm_creation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_vm_creation_applies_and_destroys_its_own_copy() {
    let provider = MockProvider::new();
    let ctx = suite(provider.clone(), MockInspector::healthy());

    let report = run_scenario(Scenario::VmCreation, &ctx).await;

    assert_eq!(report.name, "vm_creation");
    assert_eq!(report.outcome, ScenarioOutcome::Passed);
    assert_eq!(provider.apply_count(), 1);
    assert_eq!(provider.destroy_count(), 1);
    // Scoped scenarios never touch the shared setup.
    assert_eq!(ctx.setup.teardown().await, vmprobe::domain::TeardownReport::Skipped);
}

#[tokio::test]
async fn test_vm_creation_missing_vm_fails_and_still_destroys() {
    let provider = MockProvider::new();
    let inspector = MockInspector {
        vm_exists: false,
        ..MockInspector::healthy()
    };
    let ctx = suite(provider.clone(), inspector);

    let report = run_scenario(Scenario::VmCreation, &ctx).await;

    let messages = failure_messages(&report.outcome);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("does not exist"));
    assert_eq!(provider.destroy_count(), 1);
}

#[tokio::test]
async fn test_vm_creation_apply_failure_still_destroys() {
    let provider = MockProvider::failing_apply();
    let ctx = suite(provider.clone(), MockInspector::healthy());

    let report = run_scenario(Scenario::VmCreation, &ctx).await;

    assert!(matches!(
        report.outcome,
        ScenarioOutcome::Errored(HarnessError::Setup(SetupError::ApplyFailed(_)))
    ));
    // A partial apply may have created resources.
    assert_eq!(provider.destroy_count(), 1);
}

#[tokio::test]
async fn test_vm_creation_apply_and_destroy_failure_reports_both() {
    let mut provider = MockProvider::failing_apply();
    provider.fail_destroy = true;
    let ctx = suite(provider.clone(), MockInspector::healthy());

    let report = run_scenario(Scenario::VmCreation, &ctx).await;

    let ScenarioOutcome::Errored(HarnessError::Teardown(message)) = &report.outcome else {
        panic!("expected teardown error, got {:?}", report.outcome);
    };
    assert!(message.contains("still in use"), "{message}");
    assert!(message.contains("authorization failed"), "{message}");
    assert_eq!(provider.destroy_count(), 1);
}

#[tokio::test]
async fn test_vm_creation_destroy_failure_errors() {
    let mut provider = MockProvider::new();
    provider.fail_destroy = true;
    let ctx = suite(provider.clone(), MockInspector::healthy());

    let report = run_scenario(Scenario::VmCreation, &ctx).await;

    assert!(matches!(
        report.outcome,
        ScenarioOutcome::Errored(HarnessError::Teardown(_))
    ));
    assert_eq!(provider.destroy_count(), 1);
}

// ── nic_exists_and_attached ──────────────────────────────────────────────────

#[tokio::test]
async fn test_nic_attached_passes() {
    let provider = MockProvider::new();
    let ctx = suite(provider.clone(), MockInspector::healthy());

    let report = run_scenario(Scenario::NicExistsAndAttached, &ctx).await;

    assert_eq!(report.outcome, ScenarioOutcome::Passed);
    assert_eq!(provider.apply_count(), 1);
    assert_eq!(provider.destroy_count(), 0, "shared state outlives the scenario");
}

#[tokio::test]
async fn test_nic_attached_to_other_interface_fails() {
    let mut vm = jammy_vm();
    vm.network_interface_ids = vec![nic_resource_id(SUB, RG, "nic2")];
    let ctx = suite(MockProvider::new(), MockInspector::healthy().with_vm(vm));

    let report = run_scenario(Scenario::NicExistsAndAttached, &ctx).await;

    let messages = failure_messages(&report.outcome);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("not attached"));
    assert!(messages[0].contains(NIC));
}

#[tokio::test]
async fn test_nic_missing_and_detached_reports_both_failures() {
    let mut vm = jammy_vm();
    vm.network_interface_ids.clear();
    let inspector = MockInspector {
        nic_exists: false,
        ..MockInspector::healthy().with_vm(vm)
    };
    let ctx = suite(MockProvider::new(), inspector);

    let report = run_scenario(Scenario::NicExistsAndAttached, &ctx).await;

    assert_eq!(failure_messages(&report.outcome).len(), 2);
}

#[tokio::test]
async fn test_nic_inspection_error_is_errored() {
    let inspector = MockInspector {
        vm: None,
        ..MockInspector::healthy()
    };
    let ctx = suite(MockProvider::new(), inspector);

    let report = run_scenario(Scenario::NicExistsAndAttached, &ctx).await;

    let ScenarioOutcome::Errored(HarnessError::Inspection { operation, reason }) = report.outcome
    else {
        panic!("expected an inspection error");
    };
    assert_eq!(operation, "get_virtual_machine");
    assert!(reason.contains("connection refused"));
}

#[tokio::test]
async fn test_shared_setup_failure_errors_every_shared_scenario() {
    let provider = MockProvider::failing_apply();
    let ctx = suite(provider.clone(), MockInspector::healthy());

    let nic = run_scenario(Scenario::NicExistsAndAttached, &ctx).await;
    let image = run_scenario(Scenario::UbuntuImage, &ctx).await;

    for report in [nic, image] {
        assert!(matches!(
            report.outcome,
            ScenarioOutcome::Errored(HarnessError::Setup(SetupError::ApplyFailed(_)))
        ));
    }
    assert_eq!(provider.apply_count(), 1);
}

// ── ubuntu_image ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ubuntu_image_matches() {
    let ctx = suite(MockProvider::new(), MockInspector::healthy());
    let report = run_scenario(Scenario::UbuntuImage, &ctx).await;
    assert_eq!(report.outcome, ScenarioOutcome::Passed);
}

#[tokio::test]
async fn test_ubuntu_image_mismatch_names_the_field() {
    let mut vm = jammy_vm();
    vm.image_reference.offer = Some("0001-com-ubuntu-server-focal".to_string());
    let ctx = suite(MockProvider::new(), MockInspector::healthy().with_vm(vm));

    let report = run_scenario(Scenario::UbuntuImage, &ctx).await;

    let messages = failure_messages(&report.outcome);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("offer"));
    assert!(messages[0].contains("focal"));
}

#[tokio::test]
async fn test_ubuntu_image_version_is_ignored() {
    let mut vm = jammy_vm();
    vm.image_reference.version = Some("22.04.202401010".to_string());
    let ctx = suite(MockProvider::new(), MockInspector::healthy().with_vm(vm));

    let report = run_scenario(Scenario::UbuntuImage, &ctx).await;

    assert_eq!(report.outcome, ScenarioOutcome::Passed);
}
