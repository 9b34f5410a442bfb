//! Application services: use-case orchestration over the port traits.

pub mod lifecycle;
pub mod scenarios;
pub mod setup;

pub use lifecycle::{ExecutionMode, run_suite, run_suite_until};
pub use scenarios::{SuiteContext, run_scenario};
pub use setup::{SetupCoordinator, SetupState};
