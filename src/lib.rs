//! `timesheet-ingest` collects employee timesheet workbooks from a Google Drive folder (plus an
//! optional ad-hoc upload) and turns them into one ordered batch of [`types::EmployeeRecord`]s
//! for bulk persistence.
//!
//! The primary entrypoint is [`ingestion::IngestionOrchestrator`], which:
//!
//! - lists the folder through a [`drive::FolderLister`]
//! - streams every file through a [`drive::FileStreamer`], one at a time by default
//! - decodes the first sheet of each workbook ([`ingestion::excel`])
//! - normalizes `DueDate` cells into ISO-8601 dates ([`ingestion::dates`])
//! - skips files that fail to stream or decode, without aborting the run
//! - appends the uploaded workbook's records after all drive records
//!
//! ## Expected sheet layout
//!
//! First sheet only, header row first, case-sensitive headers:
//! `FirstName`, `LastName`, `DueDate`, `WorkStatus`, `Attendance`.
//!
//! `DueDate` may be a date-formatted cell or a plain day serial (`25569` is `1970-01-01`).
//! A missing or unreadable date is stored as `Invalid Date`; the row is kept.
//!
//! ## Quick example: run against custom ports
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use timesheet_ingest::config::DriveConfig;
//! use timesheet_ingest::drive::GoogleDriveClient;
//! use timesheet_ingest::ingestion::{IngestionOptions, IngestionOrchestrator};
//! use timesheet_ingest::storage::MemoryStore;
//!
//! # async fn demo() -> Result<(), timesheet_ingest::IngestionError> {
//! let drive = Arc::new(GoogleDriveClient::new(&DriveConfig {
//!     folder_id: Some("my-folder".to_string()),
//!     access_token: Some("ya29....".to_string()),
//!     ..Default::default()
//! }));
//! let orchestrator =
//!     IngestionOrchestrator::new(drive.clone(), drive, IngestionOptions::default());
//!
//! let store = MemoryStore::new();
//! let summary = orchestrator.ingest_and_persist(&store, Some("my-folder"), None).await?;
//! println!("records={}", summary.total_records);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: decoding, date normalization, projection and run orchestration
//! - [`drive`]: remote folder ports and the Google Drive client
//! - [`storage`]: storage port, SQLite and in-memory stores
//! - [`execution`]: per-file scheduling options and run metrics
//! - [`http`]: axum routes under `/api/timesheet`
//! - [`config`]: environment-driven configuration
//! - [`types`]: data model
//! - [`error`]: error taxonomy

pub mod config;
pub mod drive;
pub mod error;
pub mod execution;
pub mod http;
pub mod ingestion;
pub mod storage;
pub mod types;

pub use error::{IngestionError, IngestionResult};
