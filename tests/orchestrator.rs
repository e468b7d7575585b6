mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use timesheet_ingest::IngestionError;
use timesheet_ingest::execution::ExecutionOptions;
use timesheet_ingest::ingestion::{
    IngestionContext, IngestionObserver, IngestionOptions, IngestionOrchestrator, IngestionSeverity,
    IngestionStats,
};
use timesheet_ingest::storage::TimesheetStore;

use common::{CountingStore, FakeDrive, timesheet_xlsx};

const FOLDER: &str = "folder-1";

fn orchestrator(drive: FakeDrive) -> (Arc<FakeDrive>, IngestionOrchestrator) {
    orchestrator_with(drive, IngestionOptions::default())
}

fn orchestrator_with(
    drive: FakeDrive,
    options: IngestionOptions,
) -> (Arc<FakeDrive>, IngestionOrchestrator) {
    let drive = Arc::new(drive);
    let orch = IngestionOrchestrator::new(drive.clone(), drive.clone(), options);
    (drive, orch)
}

fn names(records: &[timesheet_ingest::types::EmployeeRecord]) -> Vec<&str> {
    records.iter().map(|r| r.first_name.as_deref().unwrap_or("")).collect()
}

fn assert_send<T: Send>(_: &T) {}

#[tokio::test]
async fn run_future_is_send() {
    let drive = FakeDrive::new().with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0)]));
    let (_, orch) = orchestrator_with(drive, IngestionOptions {
        execution: ExecutionOptions::bounded(2),
        ..IngestionOptions::default()
    });
    let store = CountingStore::new();

    let run = orch.run(Some(FOLDER), None);
    assert_send(&run);
    assert_eq!(run.await.unwrap().batch.len(), 1);

    let persist = orch.ingest_and_persist(&store, Some(FOLDER), None);
    assert_send(&persist);
    assert_eq!(persist.await.unwrap().total_records, 1);
}

#[tokio::test]
async fn overlapping_runs_keep_separate_metrics() {
    let drive = FakeDrive::new()
        .with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0)]))
        .with_workbook("b", "b.xlsx", timesheet_xlsx(&[("b1", 45000.0)]))
        .with_delay("a", Duration::from_millis(40));
    let (_, orch) = orchestrator(drive);
    let orch = Arc::new(orch);

    let first = tokio::spawn({
        let orch = Arc::clone(&orch);
        async move { orch.run(Some(FOLDER), None).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = orch.run(Some(FOLDER), None).await.unwrap();
    let first = first.await.unwrap().unwrap();

    for report in [&first, &second] {
        assert_eq!(report.metrics.files_listed, 2);
        assert_eq!(report.metrics.files_ingested, 2);
        assert_eq!(report.metrics.records, 2);
        assert_eq!(report.metrics.max_active_files, 1);
        assert_eq!(names(report.batch.records()), vec!["a1", "b1"]);
    }
}

#[tokio::test]
async fn records_follow_listing_order_then_row_order() {
    let drive = FakeDrive::new()
        .with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0), ("a2", 45001.0)]))
        .with_workbook("b", "b.xlsx", timesheet_xlsx(&[("b1", 45002.0)]));
    let (drive, orch) = orchestrator(drive);

    let report = orch.run(Some(FOLDER), None).await.unwrap();

    assert_eq!(names(report.batch.records()), vec!["a1", "a2", "b1"]);
    assert!(report.skipped.is_empty());
    assert_eq!(*drive.listed.lock().unwrap(), vec![FOLDER.to_string()]);
    assert_eq!(*drive.opened.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(report.metrics.files_listed, 2);
    assert_eq!(report.metrics.files_ingested, 2);
    assert_eq!(report.metrics.records, 3);
}

#[tokio::test]
async fn upload_records_are_appended_last() {
    let drive = FakeDrive::new().with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0)]));
    let (_, orch) = orchestrator(drive);
    let upload = Bytes::from(timesheet_xlsx(&[("u1", 45000.0), ("u2", 45000.0)]));

    let report = orch.run(Some(FOLDER), Some(upload)).await.unwrap();

    assert_eq!(names(report.batch.records()), vec!["a1", "u1", "u2"]);
}

#[tokio::test]
async fn a_broken_stream_skips_only_that_file() {
    let drive = FakeDrive::new()
        .with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0)]))
        .with_broken_stream("b", "b.xlsx")
        .with_workbook("c", "c.xlsx", timesheet_xlsx(&[("c1", 45000.0)]));
    let (_, orch) = orchestrator(drive);

    let report = orch.run(Some(FOLDER), None).await.unwrap();

    assert_eq!(names(report.batch.records()), vec!["a1", "c1"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].handle.id, "b");
    assert!(matches!(report.skipped[0].error, IngestionError::Stream { .. }));
    assert_eq!(report.metrics.files_skipped, 1);
}

#[tokio::test]
async fn a_file_that_is_not_a_workbook_is_skipped() {
    let drive = FakeDrive::new()
        .with_workbook("notes", "notes.txt", b"just some text".to_vec())
        .with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0)]));
    let (_, orch) = orchestrator(drive);

    let report = orch.run(Some(FOLDER), None).await.unwrap();

    assert_eq!(names(report.batch.records()), vec!["a1"]);
    assert!(matches!(report.skipped[0].error, IngestionError::Parse { .. }));
}

#[tokio::test]
async fn empty_folder_without_upload_is_fatal() {
    let (_, orch) = orchestrator(FakeDrive::new());

    let err = orch.run(Some(FOLDER), None).await.unwrap_err();

    assert!(matches!(err, IngestionError::EmptyFolder { ref folder_id } if folder_id == FOLDER));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn empty_folder_with_upload_ingests_the_upload() {
    let (_, orch) = orchestrator(FakeDrive::new());
    let upload = Bytes::from(timesheet_xlsx(&[("u1", 45000.0)]));

    let report = orch.run(Some(FOLDER), Some(upload)).await.unwrap();

    assert_eq!(names(report.batch.records()), vec!["u1"]);
}

#[tokio::test]
async fn unreadable_upload_fails_the_run() {
    let drive = FakeDrive::new().with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0)]));
    let (_, orch) = orchestrator(drive);

    let err = orch
        .run(Some(FOLDER), Some(Bytes::from_static(b"nope")))
        .await
        .unwrap_err();

    assert!(matches!(err, IngestionError::Parse { .. }));
}

#[tokio::test]
async fn missing_folder_id_is_a_config_error_before_listing() {
    let (drive, orch) = orchestrator(FakeDrive::new());

    for folder in [None, Some(""), Some("   ")] {
        let err = orch.run(folder, None).await.unwrap_err();
        assert!(matches!(err, IngestionError::Config { .. }), "{err:?}");
    }
    assert!(drive.listed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rejected_credentials_abort_the_run() {
    let drive = FakeDrive::new()
        .with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0)]))
        .rejecting_auth();
    let (drive, orch) = orchestrator(drive);

    let err = orch.run(Some(FOLDER), None).await.unwrap_err();

    assert!(matches!(err, IngestionError::Auth { .. }));
    assert!(drive.opened.lock().unwrap().is_empty());
}

#[tokio::test]
async fn nothing_is_persisted_when_no_rows_were_produced() {
    let header_only = timesheet_xlsx(&[]);
    let drive = FakeDrive::new().with_workbook("a", "a.xlsx", header_only);
    let (_, orch) = orchestrator(drive);
    let store = CountingStore::new();

    let summary = orch.ingest_and_persist(&store, Some(FOLDER), None).await.unwrap();

    assert_eq!(summary.total_records, 0);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn batch_is_persisted_with_one_call() {
    let drive = FakeDrive::new()
        .with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0), ("a2", 45001.0)]))
        .with_broken_stream("b", "b.xlsx");
    let (_, orch) = orchestrator(drive);
    let store = CountingStore::new();

    let summary = orch.ingest_and_persist(&store, Some(FOLDER), None).await.unwrap();

    assert_eq!(summary.total_records, 2);
    assert_eq!(summary.skipped_files, 1);
    assert_eq!(store.calls(), 1);
    assert_eq!(store.fetch_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn persist_failure_is_returned() {
    let drive = FakeDrive::new().with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0)]));
    let (_, orch) = orchestrator(drive);
    let store = CountingStore::failing();

    let err = orch.ingest_and_persist(&store, Some(FOLDER), None).await.unwrap_err();

    assert!(matches!(err, IngestionError::Persist { .. }));
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn bounded_concurrency_keeps_listing_order() {
    // first file finishes last
    let drive = FakeDrive::new()
        .with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0)]))
        .with_workbook("b", "b.xlsx", timesheet_xlsx(&[("b1", 45000.0)]))
        .with_workbook("c", "c.xlsx", timesheet_xlsx(&[("c1", 45000.0)]))
        .with_delay("a", Duration::from_millis(80))
        .with_delay("b", Duration::from_millis(40));
    let options = IngestionOptions {
        execution: ExecutionOptions::bounded(3),
        ..IngestionOptions::default()
    };
    let (_, orch) = orchestrator_with(drive, options);

    let report = orch.run(Some(FOLDER), None).await.unwrap();

    assert_eq!(names(report.batch.records()), vec!["a1", "b1", "c1"]);
    assert!(report.metrics.max_active_files >= 2);
}

#[tokio::test]
async fn sequential_runs_one_file_at_a_time() {
    let drive = FakeDrive::new()
        .with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0)]))
        .with_workbook("b", "b.xlsx", timesheet_xlsx(&[("b1", 45000.0)]))
        .with_delay("a", Duration::from_millis(20));
    let (_, orch) = orchestrator(drive);

    let report = orch.run(Some(FOLDER), None).await.unwrap();

    assert_eq!(report.metrics.max_active_files, 1);
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.events.lock().unwrap().push(format!("ok {ctx} {}", stats.records));
    }

    fn on_failure(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        _error: &IngestionError,
    ) {
        self.events.lock().unwrap().push(format!("fail {ctx} {severity:?}"));
    }

    fn on_alert(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        _error: &IngestionError,
    ) {
        self.events.lock().unwrap().push(format!("alert {ctx} {severity:?}"));
    }
}

#[tokio::test]
async fn observer_sees_successes_failures_and_alerts() {
    let drive = FakeDrive::new()
        .with_workbook("a", "a.xlsx", timesheet_xlsx(&[("a1", 45000.0)]))
        .with_broken_stream("b", "b.xlsx")
        .with_workbook("c", "c.txt", b"plain".to_vec());
    let observer = Arc::new(RecordingObserver::default());
    let options = IngestionOptions {
        observer: Some(observer.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..IngestionOptions::default()
    };
    let (_, orch) = orchestrator_with(drive, options);

    orch.run(Some(FOLDER), None).await.unwrap();

    let events = observer.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "ok drive file a.xlsx (id=a) 1".to_string(),
            "fail drive file b.xlsx (id=b) Critical".to_string(),
            "alert drive file b.xlsx (id=b) Critical".to_string(),
            "fail drive file c.txt (id=c) Error".to_string(),
        ]
    );
}
