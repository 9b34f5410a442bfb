//! Terminal output: styling, progress and the end-of-run summary.
//!
//! Everything a run logs goes to its log file; this module only writes the
//! few lines meant for the operator's terminal.

pub mod progress;
pub mod reporter;
pub mod styles;
pub mod summary;

use console::Term;
use owo_colors::{OwoColorize as _, Style};
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Where and how terminal lines are written.
pub struct OutputContext {
    pub styles: Styles,
    /// Whether stdout is a terminal.
    pub is_tty: bool,
    /// Suppress everything but errors.
    pub quiet: bool,
}

impl OutputContext {
    /// Colors are used only on a terminal, and never with `--no-color` or
    /// `NO_COLOR` set.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let colored = is_tty && !no_color && std::env::var_os("NO_COLOR").is_none();
        Self {
            styles: if colored {
                Styles::colored()
            } else {
                Styles::default()
            },
            is_tty,
            quiet,
        }
    }

    /// Spinners only make sense on an interactive, non-quiet terminal.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    fn line(&self, icon: &str, style: Style, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", icon.style(style));
        }
    }

    pub fn success(&self, msg: &str) {
        self.line("✓", self.styles.pass, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.line("⚠", self.styles.warn, msg);
    }

    pub fn info(&self, msg: &str) {
        self.line("ℹ", self.styles.note, msg);
    }

    /// Written to stderr, even when quiet.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.fail));
    }

    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.title));
        }
    }

    /// `key  value`, with the key muted.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.muted));
        }
    }
}
