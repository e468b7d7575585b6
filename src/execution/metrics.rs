use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Real-time metrics for one ingestion run.
///
/// Each run owns a fresh instance, so concurrent runs never share counters. Per-file tasks
/// update it through `&self` while the run progresses.
pub struct RunMetrics {
    started_at: Instant,
    elapsed_ns: AtomicU64,

    files_listed: AtomicU64,
    files_ingested: AtomicU64,
    files_skipped: AtomicU64,
    records: AtomicU64,
    bytes_fetched: AtomicU64,

    active_files: AtomicUsize,
    max_active_files: AtomicUsize,
}

impl RunMetrics {
    /// Start measuring a run now.
    pub fn start() -> Self {
        Self {
            started_at: Instant::now(),
            elapsed_ns: AtomicU64::new(0),
            files_listed: AtomicU64::new(0),
            files_ingested: AtomicU64::new(0),
            files_skipped: AtomicU64::new(0),
            records: AtomicU64::new(0),
            bytes_fetched: AtomicU64::new(0),
            active_files: AtomicUsize::new(0),
            max_active_files: AtomicUsize::new(0),
        }
    }

    /// Freeze the elapsed time.
    pub fn finish(&self) {
        let elapsed = self.started_at.elapsed();
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_files_listed(&self, n: usize) {
        self.files_listed.store(n as u64, Ordering::SeqCst);
    }

    pub fn on_file_start(&self) {
        let now = self.active_files.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_files, now);
    }

    pub fn on_file_end(&self) {
        let _ = self.active_files.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn on_bytes_fetched(&self, n: usize) {
        let _ = self.bytes_fetched.fetch_add(n as u64, Ordering::SeqCst);
    }

    pub fn on_file_ingested(&self, records: usize) {
        let _ = self.files_ingested.fetch_add(1, Ordering::SeqCst);
        let _ = self.records.fetch_add(records as u64, Ordering::SeqCst);
    }

    pub fn on_file_skipped(&self) {
        let _ = self.files_skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> RunMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = if elapsed_ns > 0 {
            Some(Duration::from_nanos(elapsed_ns))
        } else {
            None
        };

        RunMetricsSnapshot {
            elapsed,
            files_listed: self.files_listed.load(Ordering::SeqCst),
            files_ingested: self.files_ingested.load(Ordering::SeqCst),
            files_skipped: self.files_skipped.load(Ordering::SeqCst),
            records: self.records.load(Ordering::SeqCst),
            bytes_fetched: self.bytes_fetched.load(Ordering::SeqCst),
            max_active_files: self.max_active_files.load(Ordering::SeqCst),
        }
    }
}

impl fmt::Debug for RunMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RunMetrics").field(&self.snapshot()).finish()
    }
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    loop {
        let cur = dst.load(Ordering::SeqCst);
        if now <= cur {
            break;
        }
        if dst
            .compare_exchange(cur, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            break;
        }
    }
}

/// Immutable snapshot of [`RunMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetricsSnapshot {
    pub elapsed: Option<Duration>,
    pub files_listed: u64,
    pub files_ingested: u64,
    pub files_skipped: u64,
    /// Records produced from drive files and the upload.
    pub records: u64,
    pub bytes_fetched: u64,
    pub max_active_files: usize,
}

impl fmt::Display for RunMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "files={}/{} (skipped={}), records={}, bytes={}, max_active_files={}, elapsed={:?}",
            self.files_ingested,
            self.files_listed,
            self.files_skipped,
            self.records,
            self.bytes_fetched,
            self.max_active_files,
            self.elapsed
        )
    }
}
