//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::app::AppContext;
use crate::application::services::ExecutionMode;
use crate::domain::{HarnessConfig, Scenario};
use crate::infra;
use crate::output::OutputContext;

/// Provision an Azure VM with Terraform and verify it
///
/// Runs every scenario, writes the run log to test_<YYYYMMDD_HHMMSS>.log and
/// destroys the shared infrastructure afterwards. No flags are required.
#[derive(Parser, Debug)]
#[command(name = "vmprobe", version)]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, env = "VMPROBE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the Terraform definitions [default: ..]
    #[arg(long, env = "VMPROBE_TERRAFORM_DIR", value_name = "DIR")]
    pub terraform_dir: Option<PathBuf>,

    /// Value for the labelPrefix Terraform variable
    #[arg(long, env = "VMPROBE_LABEL_PREFIX")]
    pub label_prefix: Option<String>,

    /// Azure subscription the resources are created in
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID", value_name = "GUID")]
    pub subscription_id: Option<String>,

    /// Directory the run log is written to [default: .]
    #[arg(long, env = "VMPROBE_LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Run only this scenario (repeatable)
    #[arg(long = "scenario", value_name = "NAME")]
    pub scenarios: Vec<String>,

    /// Run scenarios one at a time instead of concurrently
    #[arg(long)]
    pub sequential: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

impl Cli {
    /// Execute the harness and return the process exit code.
    pub async fn run(self) -> ExitCode {
        let output = OutputContext::new(self.no_color, self.quiet);
        let prepared = self
            .resolve_config()
            .and_then(|config| Ok((config, Scenario::select(&self.scenarios)?)));
        let (config, scenarios) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                output.error(&format!("{e:#}"));
                return ExitCode::FAILURE;
            }
        };

        let mode = if self.sequential {
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Concurrent
        };
        AppContext {
            output,
            config,
            scenarios,
            mode,
        }
        .run()
        .await
    }

    /// Merge the YAML file, environment and flags into a validated config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or the merged
    /// configuration is invalid.
    pub fn resolve_config(&self) -> Result<HarnessConfig> {
        let mut config = infra::config::load(self.config.as_deref())?;
        if let Some(dir) = &self.terraform_dir {
            config.terraform_dir.clone_from(dir);
        }
        if let Some(prefix) = &self.label_prefix {
            config.label_prefix.clone_from(prefix);
        }
        if let Some(sub) = &self.subscription_id {
            config.subscription_id = Some(sub.clone());
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir.clone_from(dir);
        }
        config.validate()?;
        infra::config::check_terraform_dir(&config)?;
        Ok(config)
    }
}
