#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use rust_xlsxwriter::Workbook;

use timesheet_ingest::IngestionError;
use timesheet_ingest::drive::{ByteStream, FileStreamer, FolderLister};
use timesheet_ingest::error::IngestionResult;
use timesheet_ingest::storage::{MemoryStore, TimesheetStore};
use timesheet_ingest::types::{FileHandle, IngestionBatch, StoredRecord};

pub const HEADERS: [&str; 5] = ["FirstName", "LastName", "DueDate", "WorkStatus", "Attendance"];

/// Single-sheet timesheet workbook: one row per `(first_name, due_serial)`.
pub fn timesheet_xlsx(people: &[(&str, f64)]) -> Vec<u8> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    for (col, h) in HEADERS.iter().enumerate() {
        ws.write_string(0, col as u16, *h).unwrap();
    }
    for (i, (first, due)) in people.iter().enumerate() {
        let row = i as u32 + 1;
        ws.write_string(row, 0, *first).unwrap();
        ws.write_string(row, 1, "Tester").unwrap();
        ws.write_number(row, 2, *due).unwrap();
        ws.write_string(row, 3, "WorkFromOffice").unwrap();
        ws.write_string(row, 4, "Present").unwrap();
    }
    wb.save_to_buffer().unwrap()
}

enum Content {
    Workbook(Vec<u8>),
    BrokenStream(String),
}

/// In-memory folder service.
///
/// Content is streamed in small chunks; a broken file yields one chunk and then an error.
#[derive(Default)]
pub struct FakeDrive {
    listing: Vec<FileHandle>,
    contents: HashMap<String, Content>,
    delays: HashMap<String, Duration>,
    reject_auth: bool,
    pub listed: Mutex<Vec<String>>,
    pub opened: Mutex<Vec<String>>,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workbook(mut self, id: &str, name: &str, bytes: Vec<u8>) -> Self {
        self.listing.push(FileHandle::new(id, name));
        self.contents.insert(id.to_string(), Content::Workbook(bytes));
        self
    }

    pub fn with_broken_stream(mut self, id: &str, name: &str) -> Self {
        self.listing.push(FileHandle::new(id, name));
        self.contents
            .insert(id.to_string(), Content::BrokenStream("connection reset".to_string()));
        self
    }

    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    pub fn rejecting_auth(mut self) -> Self {
        self.reject_auth = true;
        self
    }
}

#[async_trait]
impl FolderLister for FakeDrive {
    async fn list(&self, folder_id: &str) -> IngestionResult<Vec<FileHandle>> {
        self.listed.lock().unwrap().push(folder_id.to_string());
        if self.reject_auth {
            return Err(IngestionError::Auth {
                message: "token expired".to_string(),
            });
        }
        Ok(self.listing.clone())
    }
}

#[async_trait]
impl FileStreamer for FakeDrive {
    async fn open(&self, handle: &FileHandle) -> IngestionResult<ByteStream> {
        self.opened.lock().unwrap().push(handle.id.clone());
        if let Some(delay) = self.delays.get(&handle.id) {
            tokio::time::sleep(*delay).await;
        }

        let file = handle.to_string();
        let chunks: Vec<IngestionResult<Bytes>> = match self.contents.get(&handle.id) {
            Some(Content::Workbook(bytes)) => bytes
                .chunks(7)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect(),
            Some(Content::BrokenStream(message)) => vec![
                Ok(Bytes::from_static(b"PK\x03\x04")),
                Err(IngestionError::Stream {
                    file,
                    message: message.clone(),
                }),
            ],
            None => {
                return Err(IngestionError::Stream {
                    file,
                    message: "not found".to_string(),
                });
            }
        };
        Ok(futures::stream::iter(chunks).boxed())
    }
}

/// Store that counts `persist` calls and can be told to fail them.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub persist_calls: Mutex<usize>,
    fail_persist: bool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_persist: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        *self.persist_calls.lock().unwrap()
    }
}

#[async_trait]
impl TimesheetStore for CountingStore {
    async fn persist(&self, batch: &IngestionBatch) -> IngestionResult<u64> {
        *self.persist_calls.lock().unwrap() += 1;
        if self.fail_persist {
            return Err(IngestionError::Persist {
                message: "disk full".to_string(),
            });
        }
        self.inner.persist(batch).await
    }

    async fn fetch_all(&self) -> IngestionResult<Vec<StoredRecord>> {
        self.inner.fetch_all().await
    }

    async fn delete_all(&self) -> IngestionResult<u64> {
        self.inner.delete_all().await
    }
}
