//! Core data model types for timesheet ingestion.
//!
//! A run decodes workbooks into [`RawRow`]s, projects each row into an [`EmployeeRecord`], and
//! collects all records of the run into a single [`IngestionBatch`].

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifies a file in the remote folder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileHandle {
    /// Remote file id (may be empty if the service returned a malformed entry).
    #[serde(default)]
    pub id: String,
    /// Display name of the file.
    #[serde(default)]
    pub name: String,
}

impl FileHandle {
    /// Create a new file handle.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id={})", self.name, self.id)
    }
}

/// A loosely-typed spreadsheet cell value.
///
/// Empty cells are never represented; they are simply absent from a [`RawRow`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Text cell.
    Text(String),
    /// Numeric cell (integers are widened to `f64`).
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// A cell the workbook marks as a date.
    Date(NaiveDate),
}

impl CellValue {
    /// Render the cell as a plain string, the way it would be copied into a text field.
    ///
    /// Whole numbers render without a fractional part (`3`, not `3.0`).
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    (*n as i64).to_string()
                } else {
                    n.to_string()
                }
            }
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// One decoded spreadsheet row: header -> cell value, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell under `header`.
    pub fn insert(&mut self, header: impl Into<String>, value: CellValue) {
        self.cells.push((header.into(), value));
    }

    /// Look up a cell by its (case-sensitive) header.
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
    }

    /// Number of non-empty cells in the row.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the row carries no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<H: Into<String>> FromIterator<(H, CellValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (H, CellValue)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(h, v)| (h.into(), v)).collect(),
        }
    }
}

/// Canonical timesheet record.
///
/// Text fields are copied verbatim from the sheet and are `None` when the cell was absent.
/// `due_date` is always present: either an ISO-8601 date or
/// [`crate::ingestion::dates::INVALID_DATE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmployeeRecord {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub due_date: String,
    pub work_status: Option<String>,
    pub attendance: Option<String>,
}

/// An [`EmployeeRecord`] as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: i64,
    #[serde(flatten)]
    pub record: EmployeeRecord,
}

/// Ordered records produced by one ingestion run.
///
/// Drive-sourced records come first (listing order, then row order), uploaded records last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionBatch {
    records: Vec<EmployeeRecord>,
}

impl IngestionBatch {
    /// Create a batch from already-ordered records.
    pub fn new(records: Vec<EmployeeRecord>) -> Self {
        Self { records }
    }

    /// Number of records in the batch.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in merge order.
    pub fn records(&self) -> &[EmployeeRecord] {
        &self.records
    }

    pub(crate) fn extend(&mut self, records: Vec<EmployeeRecord>) {
        self.records.extend(records);
    }
}
