//! Application context and the process-level run.
//!
//! `AppContext` is built once from the parsed CLI and owns everything a run
//! needs: the validated configuration, the selected scenarios and terminal
//! output. `run_logged` wraps a suite run with its log artifact so the file
//! is flushed and closed on every path before the exit code is returned.

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};

use crate::application::ports::{CloudInspector, ProvisioningProvider};
use crate::application::services::{ExecutionMode, SuiteContext, run_suite_until};
use crate::domain::{HarnessConfig, RunSummary, Scenario};
use crate::infra::{self, AzureCliInspector, LogArtifact, TerraformProvider, TokioCommandRunner};
use crate::output::{OutputContext, TerminalReporter, progress, summary};

/// Production suite: terraform for provisioning, az for inspection.
pub type AzureSuite =
    SuiteContext<TerraformProvider<TokioCommandRunner>, AzureCliInspector<TokioCommandRunner>>;

/// Unified application context for one harness run.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Validated harness configuration.
    pub config: HarnessConfig,
    /// Scenarios to run, in order.
    pub scenarios: Vec<Scenario>,
    pub mode: ExecutionMode,
}

/// Result of a logged run.
pub struct LoggedRun {
    pub summary: RunSummary,
    pub log_path: PathBuf,
}

impl AppContext {
    /// Build the production suite context from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription id is invalid or the terraform
    /// adapter cannot be constructed.
    pub fn suite(&self) -> Result<AzureSuite> {
        let subscription = self.config.subscription()?.to_string();
        let tool = self.config.terraform.clone();
        let provider = TerraformProvider::new(TokioCommandRunner::new(tool.apply_timeout()), tool)?;
        let inspector = AzureCliInspector::new(
            TokioCommandRunner::new(self.config.terraform.command_timeout()),
            self.config.az_bin.clone(),
        );
        Ok(SuiteContext::new(
            Arc::new(provider),
            Arc::new(inspector),
            self.config.provisioning_config(),
            subscription,
            self.config.expected_image(),
        ))
    }

    /// Run the whole harness and return the process exit code.
    ///
    /// Creates `test_<timestamp>.log`, sends all tracing output there, runs
    /// the scenarios and teardown, closes the log and prints a summary.
    pub async fn run(&self) -> ExitCode {
        let suite = match self.suite() {
            Ok(suite) => suite,
            Err(e) => {
                self.output.error(&format!("{e:#}"));
                return ExitCode::FAILURE;
            }
        };

        let artifact = match LogArtifact::create(&self.config.log_dir, Local::now().naive_local())
        {
            Ok(artifact) => artifact,
            Err(e) => {
                self.output.error(&format!("{e:#}"));
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = infra::logging::init_tracing(artifact.sink()) {
            self.output.warn(&format!("{e:#}"));
        }

        let run = run_logged(
            Arc::new(suite),
            &self.scenarios,
            self.mode,
            artifact,
            &self.output,
            shutdown_signal(),
        )
        .await;
        summary::render(&self.output, &run.summary, &run.log_path);
        ExitCode::from(run.summary.exit_code())
    }
}

/// Resolves on the first Ctrl-C. Never resolves if the handler cannot be
/// installed, so the run carries on uninterruptible.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl-C");
}

/// Run `scenarios` with all report output going to `artifact`, then close it.
///
/// The artifact is closed (flushed and synced) before this returns, whatever
/// the scenarios did. A failure to close is printed, not propagated. When
/// `shutdown` resolves, the remaining scenarios are abandoned and the shared
/// teardown still runs.
pub async fn run_logged<P, I, S>(
    suite: Arc<SuiteContext<P, I>>,
    scenarios: &[Scenario],
    mode: ExecutionMode,
    artifact: LogArtifact,
    output: &OutputContext,
    shutdown: S,
) -> LoggedRun
where
    P: ProvisioningProvider,
    I: CloudInspector,
    S: Future<Output = ()>,
{
    let log_path = artifact.path().to_path_buf();
    output.info(&format!("logging to {}", log_path.display()));

    let mut reporter = TerminalReporter::new(output);
    let spinner = output
        .show_progress()
        .then(|| progress::spinner("provisioning and verifying..."));
    if let Some(pb) = &spinner {
        reporter = reporter.with_spinner(pb.clone());
    }

    let mut sink = artifact.sink();
    let summary = run_suite_until(suite, scenarios, mode, &reporter, &mut sink, shutdown).await;

    if let Some(pb) = &spinner {
        progress::finish_clear(pb);
    }
    if let Err(e) = artifact.close() {
        output.error(&format!("{e:#}"));
    }
    LoggedRun { summary, log_path }
}
