//! End-of-run summary for the terminal.

use std::path::Path;

use crate::domain::{RunSummary, ScenarioOutcome, TeardownReport};
use crate::output::OutputContext;

/// Print per-scenario results, the teardown result and the log location.
pub fn render(ctx: &OutputContext, summary: &RunSummary, log_path: &Path) {
    ctx.header("Scenarios:");
    for report in &summary.reports {
        match &report.outcome {
            ScenarioOutcome::Passed => ctx.success(&report.name),
            ScenarioOutcome::Failed(failures) => {
                ctx.error(&format!(
                    "{} ({} assertion(s) failed)",
                    report.name,
                    failures.len()
                ));
            }
            ScenarioOutcome::Errored(err) => ctx.error(&format!("{}: {err}", report.name)),
        }
    }

    match &summary.teardown {
        TeardownReport::Skipped => ctx.info("teardown: nothing to destroy"),
        TeardownReport::Destroyed => ctx.success("teardown: shared infrastructure destroyed"),
        // Never suppressed: leaked resources cost money.
        TeardownReport::Failed(reason) => ctx.error(&format!("teardown failed: {reason}")),
    }

    ctx.kv(
        "Result:",
        &format!("{} passed, {} failed", summary.passed(), summary.failed()),
    );
    ctx.kv("Log:", &log_path.display().to_string());
}
