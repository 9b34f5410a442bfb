//! Naming of the per-run log artifact.

use chrono::NaiveDateTime;

/// `strftime` pattern for the timestamp embedded in the log file name.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Log file name for a run started at `started_at`: `test_YYYYMMDD_HHMMSS.log`.
///
/// Two runs starting within the same second map to the same name.
#[must_use]
pub fn log_file_name(started_at: NaiveDateTime) -> String {
    format!("test_{}.log", started_at.format(LOG_TIMESTAMP_FORMAT))
}
