//! Terminal stylesheet built on owo-colors.

use owo_colors::Style;

/// Styles for the harness's terminal lines. `Default` is uncolored.
#[derive(Debug, Default, Clone, Copy)]
pub struct Styles {
    /// Passed scenarios, completed teardown.
    pub pass: Style,
    /// Failed or errored scenarios, teardown failures.
    pub fail: Style,
    pub warn: Style,
    /// Progress steps and neutral notes.
    pub note: Style,
    /// Labels in key/value lines.
    pub muted: Style,
    pub title: Style,
}

impl Styles {
    /// The colored palette.
    #[must_use]
    pub fn colored() -> Self {
        Self {
            pass: Style::new().green(),
            fail: Style::new().red().bold(),
            warn: Style::new().yellow(),
            note: Style::new().blue(),
            muted: Style::new().dimmed(),
            title: Style::new().bold().cyan(),
        }
    }
}
