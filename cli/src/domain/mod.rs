//! Domain layer: pure types, checks and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs` or `std::process`. All functions are synchronous and
//! take data in, returning data out.

pub mod artifact;
pub mod config;
pub mod error;
pub mod provisioning;
pub mod report;
pub mod scenario;
pub mod vm;

pub use config::HarnessConfig;
pub use error::{ConfigError, HarnessError, SetupError};
pub use provisioning::{ProvisionedOutputs, ProvisioningConfig, ProvisioningHandle};
pub use report::{
    AssertionFailure, Checks, RunSummary, ScenarioOutcome, ScenarioReport, TeardownReport,
};
pub use scenario::{Scenario, Strategy};
pub use vm::{ExpectedImage, ImageReference, VmDescriptor};
