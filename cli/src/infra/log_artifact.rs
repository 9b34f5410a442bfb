//! The per-run log file, `test_<YYYYMMDD_HHMMSS>.log`.
//!
//! `LogArtifact` owns the file. `LogSink` is a cheap cloneable writer onto it
//! that both the tracing subscriber and the scenario report writer use.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing_subscriber::fmt::MakeWriter;

use crate::domain::artifact::log_file_name;

/// Shared, buffered writer onto the log file.
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        // One lock per record keeps concurrent lines from interleaving.
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// The log file for one run. Created once at start, closed once at end.
pub struct LogArtifact {
    path: PathBuf,
    sink: LogSink,
}

impl LogArtifact {
    /// Create `test_<timestamp>.log` in `dir`, truncating any file of the
    /// same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(dir: &Path, started_at: NaiveDateTime) -> Result<Self> {
        let path = dir.join(log_file_name(started_at));
        let file = File::create(&path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        Ok(Self {
            path,
            sink: LogSink {
                inner: Arc::new(Mutex::new(BufWriter::new(file))),
            },
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A writer onto the log file.
    #[must_use]
    pub fn sink(&self) -> LogSink {
        self.sink.clone()
    }

    /// Flush buffered output and sync the file to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing or syncing fails.
    pub fn close(self) -> Result<()> {
        let mut writer = self
            .sink
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        writer
            .flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        writer
            .get_ref()
            .sync_all()
            .with_context(|| format!("failed to sync {}", self.path.display()))
    }
}

impl Drop for LogArtifact {
    fn drop(&mut self) {
        // Best effort on paths that skip `close`, e.g. unwinding.
        let _ = self
            .sink
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush();
    }
}
