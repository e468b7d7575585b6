//! Row -> [`EmployeeRecord`] projection.

use crate::types::{CellValue, EmployeeRecord, RawRow};

use super::dates::normalize_due_date;

/// Expected (case-sensitive) column headers.
pub mod columns {
    pub const FIRST_NAME: &str = "FirstName";
    pub const LAST_NAME: &str = "LastName";
    pub const DUE_DATE: &str = "DueDate";
    pub const WORK_STATUS: &str = "WorkStatus";
    pub const ATTENDANCE: &str = "Attendance";
}

/// Map one decoded row into a record.
///
/// Text columns are copied as-is (no enum validation); an absent cell becomes `None`.
/// `DueDate` always gets a value, see [`normalize_due_date`].
pub fn project_row(row: &RawRow) -> EmployeeRecord {
    let text = |header: &str| row.get(header).map(CellValue::to_text);

    EmployeeRecord {
        first_name: text(columns::FIRST_NAME),
        last_name: text(columns::LAST_NAME),
        due_date: normalize_due_date(row.get(columns::DUE_DATE)),
        work_status: text(columns::WORK_STATUS),
        attendance: text(columns::ATTENDANCE),
    }
}

/// Project rows in order.
pub fn project_rows(rows: &[RawRow]) -> Vec<EmployeeRecord> {
    rows.iter().map(project_row).collect()
}
