//! One-time shared provisioning.
//!
//! `SetupCoordinator` applies the shared configuration at most once per
//! process and hands the same outputs (or the same failure) to every caller.
//! The state lives in a `tokio::sync::watch` channel: the NotStarted →
//! InProgress transition is a single `send_if_modified`, and waiters block on
//! `wait_for` until the state settles.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::application::ports::ProvisioningProvider;
use crate::domain::provisioning::REQUIRED_OUTPUTS;
use crate::domain::{
    ProvisionedOutputs, ProvisioningConfig, ProvisioningHandle, SetupError, TeardownReport,
};

/// Lifecycle of the shared setup.
///
/// Moves NotStarted → InProgress → {Completed | Failed} exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupState {
    NotStarted,
    InProgress,
    Completed(Arc<ProvisionedOutputs>),
    Failed(SetupError),
}

impl SetupState {
    fn is_settled(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

struct Shared<P> {
    provider: Arc<P>,
    config: ProvisioningConfig,
    state: watch::Sender<SetupState>,
    /// Present from a successful apply until teardown takes it.
    handle: Mutex<Option<ProvisioningHandle>>,
}

/// Ensures shared provisioning runs at most once and broadcasts its result.
pub struct SetupCoordinator<P: ProvisioningProvider> {
    shared: Arc<Shared<P>>,
}

impl<P: ProvisioningProvider> SetupCoordinator<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, config: ProvisioningConfig) -> Self {
        let (state, _) = watch::channel(SetupState::NotStarted);
        Self {
            shared: Arc::new(Shared {
                provider,
                config,
                state,
                handle: Mutex::new(None),
            }),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SetupState {
        self.shared.state.borrow().clone()
    }

    /// Return the shared outputs, applying the configuration on first call.
    ///
    /// Concurrent callers wait for the single in-flight apply. The apply
    /// runs on its own task, so dropping a caller's future never leaves the
    /// state stuck in `InProgress`.
    ///
    /// # Errors
    ///
    /// Returns the recorded `SetupError` if the shared setup failed, now or
    /// on any earlier call. A failed setup is never retried.
    pub async fn ensure_provisioned(&self) -> Result<Arc<ProvisionedOutputs>, SetupError> {
        let first = self.shared.state.send_if_modified(|state| {
            if *state == SetupState::NotStarted {
                *state = SetupState::InProgress;
                true
            } else {
                false
            }
        });
        if first {
            info!(dir = %self.shared.config.source_dir().display(), "starting shared setup");
            self.spawn_apply();
        }

        match self.wait_settled().await {
            SetupState::Completed(outputs) => Ok(outputs),
            SetupState::Failed(err) => Err(err),
            SetupState::NotStarted | SetupState::InProgress => Err(SetupError::Interrupted(
                "setup state did not settle".to_string(),
            )),
        }
    }

    /// Destroy the shared infrastructure if an apply succeeded.
    ///
    /// Waits for an in-flight apply to settle first. Runs the destroy at
    /// most once; later calls return `Skipped`. A failed destroy is logged
    /// and reported, not retried.
    pub async fn teardown(&self) -> TeardownReport {
        if *self.shared.state.borrow() != SetupState::NotStarted {
            self.wait_settled().await;
        }

        let handle = self
            .shared
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            debug!("no shared infrastructure to destroy");
            return TeardownReport::Skipped;
        };

        info!("destroying shared infrastructure");
        match self.shared.provider.destroy(&handle).await {
            Ok(()) => {
                info!("shared infrastructure destroyed");
                TeardownReport::Destroyed
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "destroying shared infrastructure failed");
                TeardownReport::Failed(format!("{e:#}"))
            }
        }
    }

    async fn wait_settled(&self) -> SetupState {
        let mut rx = self.shared.state.subscribe();
        // The sender lives in `self.shared`, so the channel cannot close here.
        match rx.wait_for(SetupState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    fn spawn_apply(&self) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let provider = Arc::clone(&shared.provider);
            let config = shared.config.clone();
            let joined = tokio::spawn(async move { provider.apply(&config).await }).await;

            let next = match joined {
                Ok(Ok(applied)) => {
                    let missing = applied.outputs.ensure_present(REQUIRED_OUTPUTS);
                    // Resources exist even when an output is missing; keep
                    // the handle so teardown still removes them.
                    *shared.handle.lock().unwrap_or_else(PoisonError::into_inner) =
                        Some(applied.handle);
                    match missing {
                        Ok(()) => {
                            info!(outputs = applied.outputs.len(), "shared setup completed");
                            SetupState::Completed(Arc::new(applied.outputs))
                        }
                        Err(err) => {
                            error!(error = %err, "shared setup produced incomplete outputs");
                            SetupState::Failed(err)
                        }
                    }
                }
                Ok(Err(e)) => {
                    error!(error = %format!("{e:#}"), "shared setup failed");
                    SetupState::Failed(SetupError::ApplyFailed(format!("{e:#}")))
                }
                Err(join_err) => {
                    warn!(error = %join_err, "shared setup task did not finish");
                    SetupState::Failed(SetupError::Interrupted(join_err.to_string()))
                }
            };
            shared.state.send_replace(next);
        });
    }
}
