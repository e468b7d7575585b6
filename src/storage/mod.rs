//! Storage port for timesheet records.
//!
//! - [`SqliteStore`]: sqlx-backed relational store used by the server
//! - [`MemoryStore`]: in-process store with the same ordering semantics

mod memory;
mod sqlite;

use async_trait::async_trait;

use crate::error::IngestionResult;
use crate::types::{IngestionBatch, StoredRecord};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Bulk persistence of ingestion batches.
#[async_trait]
pub trait TimesheetStore: Send + Sync {
    /// Insert every record of `batch`, returning how many were written.
    async fn persist(&self, batch: &IngestionBatch) -> IngestionResult<u64>;

    /// All stored records, `DueDate` descending (ties in insertion order).
    async fn fetch_all(&self) -> IngestionResult<Vec<StoredRecord>>;

    /// Remove every record. Succeeds on an empty store; returns how many were removed.
    async fn delete_all(&self) -> IngestionResult<u64>;
}
