//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! terraform and az adapters, the log file and configuration loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::output` are forbidden.

pub mod azure;
pub mod command_runner;
pub mod config;
pub mod log_artifact;
pub mod logging;
pub mod terraform;

pub use azure::AzureCliInspector;
pub use command_runner::TokioCommandRunner;
pub use log_artifact::{LogArtifact, LogSink};
pub use terraform::TerraformProvider;
