use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::error::IngestionError;
use crate::types::FileHandle;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (transport, credentials, storage).
    Critical,
}

impl IngestionSeverity {
    /// Severity for an ingestion error.
    pub fn for_error(e: &IngestionError) -> Self {
        match e {
            IngestionError::Parse { .. } => Self::Error,
            IngestionError::EmptyFolder { .. } => Self::Warning,
            IngestionError::Config { .. }
            | IngestionError::Auth { .. }
            | IngestionError::Listing { .. }
            | IngestionError::Stream { .. }
            | IngestionError::Persist { .. } => Self::Critical,
        }
    }
}

/// Where a batch of rows came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionContext {
    /// A file listed in the remote folder.
    Drive(FileHandle),
    /// The ad-hoc uploaded workbook.
    Upload,
    /// The folder listing itself.
    Folder { folder_id: String },
}

impl fmt::Display for IngestionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drive(handle) => write!(f, "drive file {handle}"),
            Self::Upload => write!(f, "uploaded file"),
            Self::Folder { folder_id } => write!(f, "folder {folder_id}"),
        }
    }
}

/// Minimal stats reported on successful ingestion of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of projected records.
    pub records: usize,
    /// Size of the workbook in bytes.
    pub bytes: usize,
}

/// Observer interface for per-source ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when a source was fetched, decoded and projected.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when a source failed (skipped file, or a fatal listing error).
    fn on_failure(
        &self,
        _ctx: &IngestionContext,
        _severity: IngestionSeverity,
        _error: &IngestionError,
    ) {
    }

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Reports ingestion events through the `log` facade.
#[derive(Debug, Default)]
pub struct LogObserver;

impl IngestionObserver for LogObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        log::info!(
            "[ingest][ok] source={} records={} bytes={}",
            ctx,
            stats.records,
            stats.bytes
        );
    }

    // The orchestrator already warns on every skipped file.
    fn on_failure(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        log::debug!("[ingest][{severity:?}] source={ctx} err={error}");
    }

    fn on_alert(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        log::error!("[ALERT][ingest][{severity:?}] source={ctx} err={error}");
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append_line(&format!(
            "{} ok source={} records={} bytes={}",
            timestamp(),
            ctx,
            stats.records,
            stats.bytes
        ));
    }

    fn on_failure(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        self.append_line(&format!(
            "{} fail severity={:?} source={} err={}",
            timestamp(),
            severity,
            ctx,
            error
        ));
    }

    fn on_alert(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        self.append_line(&format!(
            "{} ALERT severity={:?} source={} err={}",
            timestamp(),
            severity,
            ctx,
            error
        ));
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}
