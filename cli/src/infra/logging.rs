//! Tracing subscriber setup for a run.
//!
//! All events go to the run's log file; the terminal only gets progress
//! lines and the final summary.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::infra::log_artifact::LogSink;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install the global tracing subscriber writing into `sink`.
///
/// Must be called at most once per process.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(sink: LogSink) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(sink),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}
