//! Scenario progress on the terminal.
//!
//! Implements the `ProgressReporter` port over `&OutputContext`, so the
//! lifecycle service reports progress without knowing about terminals.

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Prints `→ step`, `✓ passed` and `! warning` lines unless quiet.
///
/// With a spinner attached, lines go above it instead of through it.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: Option<ProgressBar>,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx, spinner: None }
    }

    /// Print through `spinner` while it is ticking.
    #[must_use]
    pub fn with_spinner(mut self, spinner: ProgressBar) -> Self {
        self.spinner = Some(spinner);
        self
    }

    fn emit(&self, line: String) {
        if self.ctx.quiet {
            return;
        }
        match &self.spinner {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        self.emit(format!("  {} {message}", "→".style(self.ctx.styles.note)));
    }

    fn success(&self, message: &str) {
        self.emit(format!("  {} {message}", "✓".style(self.ctx.styles.pass)));
    }

    fn warn(&self, message: &str) {
        self.emit(format!("  {} {message}", "!".style(self.ctx.styles.warn)));
    }
}
