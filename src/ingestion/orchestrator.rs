//! Ingestion run orchestration.
//!
//! One run:
//!
//! 1. lists the configured folder (any failure here is fatal)
//! 2. fetches, decodes and projects every listed file, in listing order; a file that fails to
//!    stream or decode is logged and skipped
//! 3. appends the records of the uploaded workbook, if any, after all drive records
//! 4. returns the merged [`IngestionBatch`] (possibly empty)
//!
//! [`IngestionOrchestrator::ingest_and_persist`] additionally hands the batch to a
//! [`TimesheetStore`], skipping the call when there is nothing to write.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::drive::{FileStreamer, FolderLister, list_folder};
use crate::error::{IngestionError, IngestionResult};
use crate::execution::{ExecutionOptions, RunMetrics, RunMetricsSnapshot, run_ordered};
use crate::storage::TimesheetStore;
use crate::types::{EmployeeRecord, FileHandle, IngestionBatch};

use super::excel::decode_workbook;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::projector::project_rows;

/// Options controlling orchestration behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Per-file scheduling.
    pub execution: ExecutionOptions,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("execution", &self.execution)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            execution: ExecutionOptions::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// A drive file left out of the batch.
#[derive(Debug)]
pub struct SkippedFile {
    pub handle: FileHandle,
    pub error: IngestionError,
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct RunReport {
    /// Merged records: drive files in listing order, then the upload.
    pub batch: IngestionBatch,
    /// Files that failed to stream or decode, in listing order.
    pub skipped: Vec<SkippedFile>,
    pub metrics: RunMetricsSnapshot,
}

/// Outcome of [`IngestionOrchestrator::ingest_and_persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistSummary {
    /// Records in the batch (and written, when non-zero).
    pub total_records: usize,
    pub skipped_files: usize,
    pub metrics: RunMetricsSnapshot,
}

/// Composes folder listing, streaming, decoding and projection into one ordered batch.
pub struct IngestionOrchestrator {
    lister: Arc<dyn FolderLister>,
    streamer: Arc<dyn FileStreamer>,
    options: IngestionOptions,
}

impl fmt::Debug for IngestionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOrchestrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl IngestionOrchestrator {
    pub fn new(
        lister: Arc<dyn FolderLister>,
        streamer: Arc<dyn FileStreamer>,
        options: IngestionOptions,
    ) -> Self {
        Self {
            lister,
            streamer,
            options,
        }
    }

    /// Execute one ingestion run.
    ///
    /// Fails only on run-level errors: missing folder id, credentials, listing failures, an empty
    /// folder with no upload attached, or an unreadable upload. Per-file stream/parse errors are
    /// reported in [`RunReport::skipped`].
    ///
    /// Runs are independent: each one measures itself, so one orchestrator may serve
    /// overlapping runs.
    pub async fn run(
        &self,
        folder_id: Option<&str>,
        upload: Option<Bytes>,
    ) -> IngestionResult<RunReport> {
        let metrics = RunMetrics::start();
        let result = self.run_inner(&metrics, folder_id, upload).await;
        metrics.finish();

        let (batch, skipped) = result?;
        let metrics = metrics.snapshot();
        log::info!("ingestion run finished: {metrics}");
        Ok(RunReport {
            batch,
            skipped,
            metrics,
        })
    }

    /// Run, then persist the batch with a single bulk call.
    ///
    /// An empty batch is not an error, and `store` is not called for it.
    pub async fn ingest_and_persist(
        &self,
        store: &dyn TimesheetStore,
        folder_id: Option<&str>,
        upload: Option<Bytes>,
    ) -> IngestionResult<PersistSummary> {
        let report = self.run(folder_id, upload).await?;

        if report.batch.is_empty() {
            log::info!("ingestion produced no records; nothing to persist");
        } else {
            let written = store.persist(&report.batch).await.inspect_err(|e| {
                log::error!("failed to persist {} record(s): {e}", report.batch.len());
            })?;
            log::info!("persisted {written} record(s)");
        }

        Ok(PersistSummary {
            total_records: report.batch.len(),
            skipped_files: report.skipped.len(),
            metrics: report.metrics,
        })
    }

    async fn run_inner(
        &self,
        metrics: &RunMetrics,
        folder_id: Option<&str>,
        upload: Option<Bytes>,
    ) -> IngestionResult<(IngestionBatch, Vec<SkippedFile>)> {
        let handles = match list_folder(self.lister.as_ref(), folder_id).await {
            Ok(handles) => handles,
            Err(IngestionError::EmptyFolder { folder_id }) if upload.is_some() => {
                log::warn!("folder {folder_id} has no files; ingesting the upload only");
                Vec::new()
            }
            Err(e) => {
                let ctx = IngestionContext::Folder {
                    folder_id: folder_id.unwrap_or_default().to_string(),
                };
                self.report_failure(&ctx, &e);
                return Err(e);
            }
        };
        metrics.on_files_listed(handles.len());

        // owned handles keep the per-file futures `Send` for any caller lifetime
        let results = run_ordered(
            handles.clone(),
            self.options.execution.max_in_flight_files,
            |handle: FileHandle| async move { self.ingest_file(metrics, &handle).await },
        )
        .await;

        let mut batch = IngestionBatch::default();
        let mut skipped = Vec::new();
        for (handle, result) in handles.into_iter().zip(results) {
            match result {
                Ok(records) => batch.extend(records),
                Err(error) => skipped.push(SkippedFile { handle, error }),
            }
        }

        if let Some(bytes) = upload {
            let ctx = IngestionContext::Upload;
            let size = bytes.len();
            match decode_and_project(bytes).await {
                Ok(records) => {
                    metrics.on_file_ingested(records.len());
                    let stats = IngestionStats {
                        records: records.len(),
                        bytes: size,
                    };
                    self.report_success(&ctx, stats);
                    batch.extend(records);
                }
                Err(e) => {
                    self.report_failure(&ctx, &e);
                    return Err(e);
                }
            }
        }

        Ok((batch, skipped))
    }

    async fn ingest_file(
        &self,
        metrics: &RunMetrics,
        handle: &FileHandle,
    ) -> IngestionResult<Vec<EmployeeRecord>> {
        metrics.on_file_start();
        let result = async {
            let bytes = self.streamer.fetch(handle).await?;
            let size = bytes.len();
            metrics.on_bytes_fetched(size);
            let records = decode_and_project(bytes).await?;
            Ok::<_, IngestionError>((records, size))
        }
        .await;
        metrics.on_file_end();

        let ctx = IngestionContext::Drive(handle.clone());
        match result {
            Ok((records, bytes)) => {
                metrics.on_file_ingested(records.len());
                self.report_success(
                    &ctx,
                    IngestionStats {
                        records: records.len(),
                        bytes,
                    },
                );
                Ok(records)
            }
            Err(e) => {
                metrics.on_file_skipped();
                log::warn!("skipping {handle}: {e}");
                self.report_failure(&ctx, &e);
                Err(e)
            }
        }
    }

    fn report_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_success(ctx, stats);
        }
    }

    fn report_failure(&self, ctx: &IngestionContext, error: &IngestionError) {
        if let Some(obs) = self.options.observer.as_ref() {
            let sev = IngestionSeverity::for_error(error);
            obs.on_failure(ctx, sev, error);
            if sev >= self.options.alert_at_or_above {
                obs.on_alert(ctx, sev, error);
            }
        }
    }
}

/// Decode a workbook and project its rows, off the async runtime.
pub async fn decode_and_project<B>(bytes: B) -> IngestionResult<Vec<EmployeeRecord>>
where
    B: AsRef<[u8]> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let rows = decode_workbook(bytes.as_ref())?;
        Ok::<_, IngestionError>(project_rows(&rows))
    })
    .await
    .map_err(|e| IngestionError::Parse {
        message: format!("decode task failed: {e}"),
    })?
}
