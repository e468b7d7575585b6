use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{IngestionBatch, StoredRecord};

use super::TimesheetStore;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    records: Vec<StoredRecord>,
}

/// In-process [`TimesheetStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> IngestionResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| IngestionError::Persist {
            message: "memory store lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl TimesheetStore for MemoryStore {
    async fn persist(&self, batch: &IngestionBatch) -> IngestionResult<u64> {
        let mut inner = self.lock()?;
        for record in batch.records() {
            inner.next_id += 1;
            let id = inner.next_id;
            inner.records.push(StoredRecord {
                id,
                record: record.clone(),
            });
        }
        Ok(batch.len() as u64)
    }

    async fn fetch_all(&self) -> IngestionResult<Vec<StoredRecord>> {
        let mut out = self.lock()?.records.clone();
        // stable: equal dates keep insertion order
        out.sort_by(|a, b| b.record.due_date.cmp(&a.record.due_date));
        Ok(out)
    }

    async fn delete_all(&self) -> IngestionResult<u64> {
        let mut inner = self.lock()?;
        let removed = inner.records.len() as u64;
        inner.records.clear();
        Ok(removed)
    }
}
