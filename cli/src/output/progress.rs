//! Spinner shown while a run is in flight.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK: Duration = Duration::from_millis(100);

/// A steadily ticking spinner with elapsed time, e.g. `⠙ verifying... 42s`.
///
/// Falls back to indicatif's default spinner style if the template is
/// rejected.
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let style = ProgressStyle::with_template("  {spinner:.cyan} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let pb = ProgressBar::new_spinner()
        .with_style(style)
        .with_message(msg.to_string());
    pb.enable_steady_tick(TICK);
    pb
}

/// Remove the spinner line so the summary starts on a clean line.
pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}
