//! Whole-run orchestration: run scenarios, record their reports, tear down.
//!
//! The run's log destination is an injected writer rather than a swapped
//! global stdout; the caller owns it before and after `run_suite`.

use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::application::ports::{CloudInspector, ProgressReporter, ProvisioningProvider};
use crate::application::services::scenarios::{SuiteContext, run_scenario};
use crate::domain::{
    HarnessError, RunSummary, Scenario, ScenarioOutcome, ScenarioReport, Strategy,
    TeardownReport,
};

/// How scenarios are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Shared scenarios all at once on a `JoinSet`.
    #[default]
    Concurrent,
    /// Shared scenarios one at a time, in the given order.
    Sequential,
}

/// Run `scenarios`, write a report line for each to `log`, then tear down
/// the shared setup.
///
/// Scoped scenarios run first, one at a time, and shared scenarios start
/// only after the last scoped destroy: both apply the same configuration
/// directory and resource names. `mode` schedules the shared scenarios.
///
/// A panicking scenario is reported as errored; it never stops the others
/// or the teardown. Teardown destroys the shared infrastructure exactly once
/// if an apply succeeded, and is skipped otherwise.
pub async fn run_suite<P, I, R, W>(
    ctx: Arc<SuiteContext<P, I>>,
    scenarios: &[Scenario],
    mode: ExecutionMode,
    reporter: &R,
    log: &mut W,
) -> RunSummary
where
    P: ProvisioningProvider,
    I: CloudInspector,
    R: ProgressReporter + ?Sized,
    W: Write + ?Sized,
{
    run_suite_until(ctx, scenarios, mode, reporter, log, std::future::pending()).await
}

/// `run_suite`, stopping the scenarios early when `shutdown` completes.
///
/// Scenarios still running at that point are reported as aborted. The
/// shared teardown runs either way, after any in-flight apply settles.
pub async fn run_suite_until<P, I, R, W, S>(
    ctx: Arc<SuiteContext<P, I>>,
    scenarios: &[Scenario],
    mode: ExecutionMode,
    reporter: &R,
    log: &mut W,
    shutdown: S,
) -> RunSummary
where
    P: ProvisioningProvider,
    I: CloudInspector,
    R: ProgressReporter + ?Sized,
    W: Write + ?Sized,
    S: Future<Output = ()>,
{
    reporter.step(&format!("running {} scenario(s)", scenarios.len()));
    record(log, &format!("=== vmprobe: {} scenario(s), {mode:?}", scenarios.len()));

    let (scoped, shared): (Vec<Scenario>, Vec<Scenario>) = scenarios
        .iter()
        .copied()
        .partition(|s| s.strategy() == Strategy::Scoped);

    let mut reports = Vec::with_capacity(scenarios.len());
    let interrupted = tokio::select! {
        () = async {
            run_sequential(&ctx, &scoped, reporter, log, &mut reports).await;
            match mode {
                ExecutionMode::Concurrent => {
                    run_concurrent(&ctx, &shared, reporter, log, &mut reports).await;
                }
                ExecutionMode::Sequential => {
                    run_sequential(&ctx, &shared, reporter, log, &mut reports).await;
                }
            }
        } => false,
        () = shutdown => true,
    };

    if interrupted {
        warn!("interrupted, stopping scenarios");
        record(log, "=== interrupted");
        reporter.warn("interrupted, tearing down");
    }
    let reason = if interrupted {
        "interrupted before completion"
    } else {
        "scenario produced no report"
    };
    for &scenario in scenarios {
        if !reports.iter().any(|r| r.name == scenario.name()) {
            let report = aborted(scenario, reason);
            finish(&report, reporter, log);
            reports.push(report);
        }
    }

    // Report in the order scenarios were requested, not completion order.
    reports.sort_by_key(|r| {
        scenarios
            .iter()
            .position(|s| s.name() == r.name)
            .unwrap_or(usize::MAX)
    });

    let teardown = ctx.setup.teardown().await;
    match &teardown {
        TeardownReport::Skipped => record(log, "=== teardown: nothing to destroy"),
        TeardownReport::Destroyed => {
            record(log, "=== teardown: shared infrastructure destroyed");
            reporter.success("shared infrastructure destroyed");
        }
        TeardownReport::Failed(reason) => {
            record(log, &format!("=== teardown FAILED: {reason}"));
            reporter.warn(&format!("teardown failed: {reason}"));
        }
    }

    let summary = RunSummary { reports, teardown };
    let verdict = if summary.exit_code() == 0 { "PASS" } else { "FAIL" };
    record(
        log,
        &format!(
            "{verdict}: {} passed, {} failed",
            summary.passed(),
            summary.failed()
        ),
    );
    if let Err(e) = log.flush() {
        warn!(error = %e, "flushing run log failed");
    }
    summary
}

async fn run_concurrent<P, I, R, W>(
    ctx: &Arc<SuiteContext<P, I>>,
    scenarios: &[Scenario],
    reporter: &R,
    log: &mut W,
    reports: &mut Vec<ScenarioReport>,
) where
    P: ProvisioningProvider,
    I: CloudInspector,
    R: ProgressReporter + ?Sized,
    W: Write + ?Sized,
{
    // A panicking task surfaces as a `JoinError`; its id maps it back to
    // the scenario.
    let mut set = JoinSet::new();
    let mut running = HashMap::with_capacity(scenarios.len());
    for &scenario in scenarios {
        let ctx = Arc::clone(ctx);
        let handle = set.spawn(async move { run_scenario(scenario, &ctx).await });
        running.insert(handle.id(), scenario);
    }

    while let Some(joined) = set.join_next().await {
        let report = match joined {
            Ok(report) => report,
            Err(join_err) => match running.get(&join_err.id()) {
                Some(&scenario) => aborted(scenario, &join_err.to_string()),
                None => {
                    error!(error = %join_err, "unknown scenario task failed");
                    continue;
                }
            },
        };
        finish(&report, reporter, log);
        reports.push(report);
    }
}

async fn run_sequential<P, I, R, W>(
    ctx: &Arc<SuiteContext<P, I>>,
    scenarios: &[Scenario],
    reporter: &R,
    log: &mut W,
    reports: &mut Vec<ScenarioReport>,
) where
    P: ProvisioningProvider,
    I: CloudInspector,
    R: ProgressReporter + ?Sized,
    W: Write + ?Sized,
{
    for &scenario in scenarios {
        let report = guarded(scenario, Arc::clone(ctx)).await;
        finish(&report, reporter, log);
        reports.push(report);
    }
}

/// Run a scenario on its own task so a panic becomes an errored report.
/// Used where scenarios run one at a time.
async fn guarded<P, I>(scenario: Scenario, ctx: Arc<SuiteContext<P, I>>) -> ScenarioReport
where
    P: ProvisioningProvider,
    I: CloudInspector,
{
    match tokio::spawn(async move { run_scenario(scenario, &ctx).await }).await {
        Ok(report) => report,
        Err(join_err) => aborted(scenario, &join_err.to_string()),
    }
}

fn aborted(scenario: Scenario, reason: &str) -> ScenarioReport {
    error!(scenario = %scenario, reason, "scenario aborted");
    ScenarioReport {
        name: scenario.name().to_string(),
        outcome: ScenarioOutcome::Errored(HarnessError::Aborted(reason.to_string())),
        duration: Duration::ZERO,
    }
}

fn finish<R, W>(report: &ScenarioReport, reporter: &R, log: &mut W)
where
    R: ProgressReporter + ?Sized,
    W: Write + ?Sized,
{
    record(log, &report.to_string());
    if report.outcome.is_pass() {
        reporter.success(&report.name);
    } else {
        reporter.warn(&format!("{} {}", report.name, report.outcome.label()));
    }
    info!(scenario = %report.name, result = report.outcome.label(), "scenario finished");
}

fn record<W: Write + ?Sized>(log: &mut W, line: &str) {
    if let Err(e) = writeln!(log, "{line}") {
        warn!(error = %e, "writing to run log failed");
    }
}
