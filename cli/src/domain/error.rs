//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs` or `std::process`. All error types implement
//! `thiserror::Error` and convert to `anyhow::Error` via the `?` operator.

use thiserror::Error;

// ── Harness errors ────────────────────────────────────────────────────────────

/// Fatal errors that end a scenario or the run.
///
/// Assertion mismatches are not errors: they are collected as
/// [`crate::domain::report::AssertionFailure`] and never abort a scenario.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HarnessError {
    /// Shared or scoped provisioning did not complete.
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),

    /// A cloud query failed or returned an unexpected shape.
    #[error("inspection failed: {operation}: {reason}")]
    Inspection { operation: String, reason: String },

    /// Destroying provisioned resources failed.
    #[error("teardown failed: {0}")]
    Teardown(String),

    /// The scenario task panicked or was aborted.
    #[error("scenario aborted: {0}")]
    Aborted(String),
}

impl HarnessError {
    /// Build an `Inspection` error from any error chain.
    pub fn inspection(operation: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::Inspection {
            operation: operation.into(),
            reason: format!("{err:#}"),
        }
    }
}

// ── Setup errors ──────────────────────────────────────────────────────────────

/// Errors observed by callers of the one-time setup coordinator.
///
/// Cloneable so the same failure can be handed to every waiting caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("terraform apply failed: {0}")]
    ApplyFailed(String),

    #[error("terraform output '{0}' is missing after apply")]
    MissingOutput(String),

    #[error("setup task ended before publishing a result: {0}")]
    Interrupted(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to harness configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No Azure subscription configured. Set AZURE_SUBSCRIPTION_ID or pass --subscription-id.")]
    MissingSubscription,

    #[error("Invalid subscription id '{0}': expected a GUID like 00000000-0000-0000-0000-000000000000")]
    InvalidSubscription(String),

    #[error("Unknown scenario: {name}\n\nValid scenarios: {valid}")]
    UnknownScenario { name: String, valid: String },

    #[error("Terraform directory not found: {0}")]
    InvalidDirectory(String),

    #[error("Label prefix must not be empty")]
    EmptyLabelPrefix,
}
