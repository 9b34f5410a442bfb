//! Process execution for the `terraform` and `az` adapters.
//!
//! Children get a null stdin so a tool that unexpectedly prompts fails
//! instead of hanging, and are killed when their deadline passes.

use std::process::{Output, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::application::ports::CommandRunner;

/// `CommandRunner` backed by `tokio::process`.
///
/// The deadline is raced against the child with `tokio::select!` and the
/// child is killed explicitly on expiry; `kill_on_drop` covers callers that
/// drop the future instead.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    /// Runner whose `run` uses `timeout` as the deadline.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Read a child pipe to the end. A read error keeps what was read so far.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!(error = %e, "reading child output failed");
        }
    }
    buf
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        debug!(program, ?args, timeout_secs = timeout.as_secs(), "spawning");
        let started = Instant::now();
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Pipes are drained alongside wait() so a chatty child cannot block
        // on a full pipe buffer.
        let finished = async {
            let (status, stdout, stderr) = tokio::join!(child.wait(), drain(stdout), drain(stderr));
            status
                .with_context(|| format!("waiting for {program}"))
                .map(|status| Output {
                    status,
                    stdout,
                    stderr,
                })
        };

        tokio::select! {
            output = finished => {
                let output = output?;
                debug!(
                    program,
                    status = %output.status,
                    elapsed_ms = started.elapsed().as_millis(),
                    "process exited"
                );
                Ok(output)
            }
            () = tokio::time::sleep(timeout) => {
                warn!(program, ?args, timeout_secs = timeout.as_secs(), "deadline passed, killing");
                if let Err(e) = child.kill().await {
                    warn!(program, error = %e, "killing timed-out process failed");
                }
                bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }
}
