//! Scenario outcomes and the run summary derived from them.

use std::fmt;
use std::time::Duration;

use crate::domain::error::HarnessError;

// ── Assertions ────────────────────────────────────────────────────────────────

/// An observed state that did not match the expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    pub message: String,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Accumulates assertion failures without stopping at the first one.
#[derive(Debug, Default)]
pub struct Checks {
    failures: Vec<AssertionFailure>,
}

impl Checks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure with `message` unless `condition` holds.
    pub fn check(&mut self, condition: bool, message: impl Into<String>) {
        if !condition {
            self.fail(message);
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.failures.push(AssertionFailure {
            message: message.into(),
        });
    }

    #[must_use]
    pub fn failures(&self) -> &[AssertionFailure] {
        &self.failures
    }

    /// Convert into a scenario outcome.
    #[must_use]
    pub fn into_outcome(self) -> ScenarioOutcome {
        if self.failures.is_empty() {
            ScenarioOutcome::Passed
        } else {
            ScenarioOutcome::Failed(self.failures)
        }
    }
}

// ── Scenario results ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    Passed,
    /// One or more assertions did not hold.
    Failed(Vec<AssertionFailure>),
    /// A fatal error stopped the scenario before its assertions completed.
    Errored(HarnessError),
}

impl ScenarioOutcome {
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed(_) => "FAIL",
            Self::Errored(_) => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub name: String,
    pub outcome: ScenarioOutcome,
    pub duration: Duration,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "--- {}: {} ({:.2}s)",
            self.outcome.label(),
            self.name,
            self.duration.as_secs_f64()
        )?;
        match &self.outcome {
            ScenarioOutcome::Passed => Ok(()),
            ScenarioOutcome::Failed(failures) => {
                for failure in failures {
                    write!(f, "\n    {failure}")?;
                }
                Ok(())
            }
            ScenarioOutcome::Errored(err) => write!(f, "\n    {err}"),
        }
    }
}

// ── Teardown ──────────────────────────────────────────────────────────────────

/// What the final shared teardown did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownReport {
    /// Shared setup never completed, or teardown already ran.
    Skipped,
    Destroyed,
    Failed(String),
}

// ── Run summary ───────────────────────────────────────────────────────────────

/// Aggregate result of one harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub reports: Vec<ScenarioReport>,
    pub teardown: TeardownReport,
}

impl RunSummary {
    #[must_use]
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_pass()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.reports.len() - self.passed()
    }

    /// Process exit code: 0 when every scenario passed, 1 otherwise.
    ///
    /// A teardown failure is reported but does not fail a passing run.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(self.failed() > 0)
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
