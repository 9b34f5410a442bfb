//! Tests for whole-run orchestration: ordering, panic isolation, teardown
//! and the run log.

#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use vmprobe::app::run_logged;
use vmprobe::application::services::{ExecutionMode, run_suite, run_suite_until};
use vmprobe::domain::{HarnessError, Scenario, ScenarioOutcome, TeardownReport};
use vmprobe::infra::LogArtifact;
use vmprobe::output::OutputContext;

use crate::mocks::{
    DirState, DirStateInspector, DirStateProvider, MockInspector, MockProvider, RecordingReporter,
    jammy_vm, suite,
};

const SHARED: &[Scenario] = &[Scenario::NicExistsAndAttached, Scenario::UbuntuImage];

fn names(summary: &vmprobe::domain::RunSummary) -> Vec<&str> {
    summary.reports.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn test_all_passing_run_exits_zero_and_tears_down_once() {
    let provider = MockProvider::new();
    let ctx = Arc::new(suite(provider.clone(), MockInspector::healthy()));
    let reporter = RecordingReporter::default();
    let mut log = Vec::new();

    let summary = run_suite(ctx, &Scenario::ALL, ExecutionMode::Concurrent, &reporter, &mut log).await;

    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.passed(), 3);
    assert_eq!(summary.teardown, TeardownReport::Destroyed);
    // One shared apply plus one scoped apply; each destroyed once.
    assert_eq!(provider.apply_count(), 2);
    assert_eq!(provider.destroy_count(), 2);
    assert!(reporter.lines().contains(&"ok: shared infrastructure destroyed".to_string()));
}

#[tokio::test]
async fn test_reports_follow_request_order() {
    let ctx = Arc::new(suite(
        MockProvider::new().with_delay(Duration::from_millis(10)),
        MockInspector::healthy(),
    ));
    let order = [
        Scenario::UbuntuImage,
        Scenario::VmCreation,
        Scenario::NicExistsAndAttached,
    ];

    let summary = run_suite(
        ctx,
        &order,
        ExecutionMode::Concurrent,
        &RecordingReporter::default(),
        &mut Vec::new(),
    )
    .await;

    assert_eq!(
        names(&summary),
        ["ubuntu_image", "vm_creation", "nic_exists_and_attached"]
    );
}

#[tokio::test]
async fn test_sequential_mode_runs_in_order() {
    let ctx = Arc::new(suite(MockProvider::new(), MockInspector::healthy()));
    let reporter = RecordingReporter::default();

    let summary = run_suite(
        ctx,
        SHARED,
        ExecutionMode::Sequential,
        &reporter,
        &mut Vec::new(),
    )
    .await;

    assert_eq!(names(&summary), ["nic_exists_and_attached", "ubuntu_image"]);
    let oks: Vec<_> = reporter
        .lines()
        .into_iter()
        .filter(|l| l.starts_with("ok: ") && !l.contains("destroyed"))
        .collect();
    assert_eq!(oks, ["ok: nic_exists_and_attached", "ok: ubuntu_image"]);
}

fn dir_state_suite(
    state: &DirState,
) -> Arc<vmprobe::application::services::SuiteContext<DirStateProvider, DirStateInspector>> {
    Arc::new(suite(
        DirStateProvider {
            state: state.clone(),
            apply_delay: Duration::from_millis(5),
        },
        DirStateInspector {
            state: state.clone(),
            delay: Duration::from_millis(20),
        },
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scoped_destroy_completes_before_shared_setup_in_concurrent_mode() {
    let state = DirState::default();

    let summary = run_suite(
        dir_state_suite(&state),
        &Scenario::ALL,
        ExecutionMode::default(),
        &RecordingReporter::default(),
        &mut Vec::new(),
    )
    .await;

    assert_eq!(summary.exit_code(), 0, "{:?}", summary.reports);
    assert_eq!(summary.passed(), 3);
    assert_eq!(
        state.events(),
        ["apply ..", "destroy ..", "apply ..", "destroy .."]
    );
}

#[tokio::test]
async fn test_scoped_scenario_requested_last_still_runs_before_shared() {
    let state = DirState::default();
    let order = [
        Scenario::NicExistsAndAttached,
        Scenario::UbuntuImage,
        Scenario::VmCreation,
    ];

    let summary = run_suite(
        dir_state_suite(&state),
        &order,
        ExecutionMode::Sequential,
        &RecordingReporter::default(),
        &mut Vec::new(),
    )
    .await;

    assert_eq!(summary.exit_code(), 0, "{:?}", summary.reports);
    assert_eq!(
        names(&summary),
        ["nic_exists_and_attached", "ubuntu_image", "vm_creation"]
    );
    assert_eq!(
        state.events(),
        ["apply ..", "destroy ..", "apply ..", "destroy .."]
    );
    assert_eq!(summary.teardown, TeardownReport::Destroyed);
}

#[tokio::test]
async fn test_interrupt_aborts_scenarios_and_still_tears_down() {
    let provider = MockProvider::new().with_delay(Duration::from_millis(300));
    let ctx = Arc::new(suite(provider.clone(), MockInspector::healthy()));
    let reporter = RecordingReporter::default();
    let mut log = Vec::new();

    let summary = run_suite_until(
        ctx,
        SHARED,
        ExecutionMode::Concurrent,
        &reporter,
        &mut log,
        tokio::time::sleep(Duration::from_millis(50)),
    )
    .await;

    assert_eq!(summary.exit_code(), 1);
    assert_eq!(names(&summary), ["nic_exists_and_attached", "ubuntu_image"]);
    for report in &summary.reports {
        let ScenarioOutcome::Errored(HarnessError::Aborted(reason)) = &report.outcome else {
            panic!("expected aborted, got {:?}", report.outcome);
        };
        assert!(reason.contains("interrupted"), "{reason}");
    }
    // The in-flight apply finishes on its own task and is then destroyed.
    assert_eq!(summary.teardown, TeardownReport::Destroyed);
    assert_eq!(provider.apply_count(), 1);
    assert_eq!(provider.destroy_count(), 1);
    let log = String::from_utf8(log).expect("utf8 log");
    assert!(log.contains("=== interrupted"));
    assert!(reporter.lines().contains(&"warn: interrupted, tearing down".to_string()));
}

#[tokio::test]
async fn test_panicking_scenario_is_isolated_in_sequential_mode() {
    let inspector = MockInspector {
        panic_on_get: true,
        ..MockInspector::healthy()
    };
    let ctx = Arc::new(suite(MockProvider::new(), inspector));

    let summary = run_suite(
        ctx,
        SHARED,
        ExecutionMode::Sequential,
        &RecordingReporter::default(),
        &mut Vec::new(),
    )
    .await;

    assert_eq!(summary.reports.len(), 2);
    assert!(summary.reports.iter().all(|r| matches!(
        r.outcome,
        ScenarioOutcome::Errored(HarnessError::Aborted(_))
    )));
    assert_eq!(summary.teardown, TeardownReport::Destroyed);
}

#[tokio::test]
async fn test_scoped_only_run_skips_shared_teardown() {
    let provider = MockProvider::new();
    let ctx = Arc::new(suite(provider.clone(), MockInspector::healthy()));

    let summary = run_suite(
        ctx,
        &[Scenario::VmCreation],
        ExecutionMode::Concurrent,
        &RecordingReporter::default(),
        &mut Vec::new(),
    )
    .await;

    assert_eq!(summary.teardown, TeardownReport::Skipped);
    assert_eq!(provider.apply_count(), 1);
    assert_eq!(provider.destroy_count(), 1);
}

#[tokio::test]
async fn test_failed_shared_setup_skips_teardown_and_exits_one() {
    let provider = MockProvider::failing_apply();
    let ctx = Arc::new(suite(provider.clone(), MockInspector::healthy()));

    let summary = run_suite(
        ctx,
        SHARED,
        ExecutionMode::Concurrent,
        &RecordingReporter::default(),
        &mut Vec::new(),
    )
    .await;

    assert_eq!(summary.exit_code(), 1);
    assert_eq!(summary.failed(), 2);
    assert_eq!(summary.teardown, TeardownReport::Skipped);
    assert_eq!(provider.apply_count(), 1);
    assert_eq!(provider.destroy_count(), 0);
}

#[tokio::test]
async fn test_assertion_failure_exits_one() {
    let mut vm = jammy_vm();
    vm.image_reference.sku = Some("20_04-lts".to_string());
    let ctx = Arc::new(suite(
        MockProvider::new(),
        MockInspector::healthy().with_vm(vm),
    ));
    let mut log = Vec::new();

    let summary = run_suite(
        ctx,
        SHARED,
        ExecutionMode::Concurrent,
        &RecordingReporter::default(),
        &mut log,
    )
    .await;

    assert_eq!(summary.exit_code(), 1);
    assert_eq!(summary.passed(), 1);
    let log = String::from_utf8(log).expect("utf8 log");
    assert!(log.contains("--- FAIL: ubuntu_image"));
    assert!(log.contains("VM image sku is '20_04-lts'"));
    assert!(log.contains("FAIL: 1 passed, 1 failed"));
}

#[tokio::test]
async fn test_teardown_failure_keeps_passing_exit_code() {
    let mut provider = MockProvider::new();
    provider.fail_destroy = true;
    let ctx = Arc::new(suite(provider.clone(), MockInspector::healthy()));
    let reporter = RecordingReporter::default();
    let mut log = Vec::new();

    let summary = run_suite(ctx, SHARED, ExecutionMode::Concurrent, &reporter, &mut log).await;

    assert!(matches!(summary.teardown, TeardownReport::Failed(_)));
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(provider.destroy_count(), 1);
    let log = String::from_utf8(log).expect("utf8 log");
    assert!(log.contains("=== teardown FAILED"));
    assert!(reporter.lines().iter().any(|l| l.starts_with("warn: teardown failed")));
}

#[tokio::test]
async fn test_panicking_scenario_is_isolated() {
    let provider = MockProvider::new();
    let inspector = MockInspector {
        panic_on_get: true,
        ..MockInspector::healthy()
    };
    let ctx = Arc::new(suite(provider.clone(), inspector));

    let summary = run_suite(
        ctx,
        &Scenario::ALL,
        ExecutionMode::Concurrent,
        &RecordingReporter::default(),
        &mut Vec::new(),
    )
    .await;

    assert_eq!(summary.reports.len(), 3);
    let by_name = |name: &str| {
        summary
            .reports
            .iter()
            .find(|r| r.name == name)
            .expect("report present")
            .outcome
            .clone()
    };
    assert_eq!(by_name("vm_creation"), ScenarioOutcome::Passed);
    for name in ["nic_exists_and_attached", "ubuntu_image"] {
        assert!(matches!(
            by_name(name),
            ScenarioOutcome::Errored(HarnessError::Aborted(_))
        ));
    }
    // The shared apply succeeded before the panics, so it is still destroyed.
    assert_eq!(summary.teardown, TeardownReport::Destroyed);
    assert_eq!(provider.destroy_count(), 2);
}

#[tokio::test]
async fn test_run_logged_writes_and_closes_log_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let started = NaiveDate::from_ymd_opt(2026, 10, 19)
        .expect("valid date")
        .and_hms_opt(9, 30, 0)
        .expect("valid time");
    let artifact = LogArtifact::create(dir.path(), started).expect("create log");
    let output = OutputContext::new(true, true);
    let ctx = Arc::new(suite(MockProvider::new(), MockInspector::healthy()));

    let run = run_logged(
        ctx,
        SHARED,
        ExecutionMode::Sequential,
        artifact,
        &output,
        std::future::pending(),
    )
    .await;

    assert_eq!(run.log_path, dir.path().join("test_20261019_093000.log"));
    let contents = std::fs::read_to_string(&run.log_path).expect("read log");
    assert!(contents.starts_with("=== vmprobe: 2 scenario(s), Sequential"));
    assert!(contents.contains("--- PASS: nic_exists_and_attached"));
    assert!(contents.contains("--- PASS: ubuntu_image"));
    assert!(contents.contains("=== teardown: shared infrastructure destroyed"));
    assert!(contents.trim_end().ends_with("PASS: 2 passed, 0 failed"));
}
