//! Ingestion pipeline.
//!
//! Most callers should use [`IngestionOrchestrator`] (from [`orchestrator`]) which:
//!
//! - lists the remote folder and streams each file in listing order
//! - decodes the first sheet of each workbook and projects rows into records
//! - isolates per-file failures and appends an optional uploaded workbook last
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! The individual stages are also available under:
//! - [`excel`]: workbook bytes -> rows
//! - [`dates`]: due-date normalization
//! - [`projector`]: row -> record

pub mod dates;
pub mod excel;
pub mod observability;
pub mod orchestrator;
pub mod projector;

pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity,
    IngestionStats, LogObserver,
};
pub use orchestrator::{
    IngestionOptions, IngestionOrchestrator, PersistSummary, RunReport, SkippedFile,
    decode_and_project,
};
