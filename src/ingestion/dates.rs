//! Due-date normalization.
//!
//! Spreadsheet dates arrive either as cells the workbook marks as dates, or as plain numbers
//! holding a day serial. Both end up as an ISO-8601 calendar date (`YYYY-MM-DD`, UTC).
//!
//! Numeric serials use the linear convention `unix_millis = (serial - 25569) * 86_400_000`,
//! so serial `25569` is `1970-01-01`. The 1900 leap-year quirk is not corrected on this path;
//! serials below 61 are therefore one day early compared to what a spreadsheet displays.

use chrono::{DateTime, Days, NaiveDate};

use crate::types::CellValue;

/// Value stored in `DueDate` when the cell is missing or cannot be read as a date.
pub const INVALID_DATE: &str = "Invalid Date";

/// Day serial of 1970-01-01.
pub const UNIX_EPOCH_SERIAL: f64 = 25_569.0;

const MILLIS_PER_DAY: f64 = 86_400.0 * 1_000.0;

/// Normalize a `DueDate` cell into a calendar date string.
///
/// Never fails: a missing or unreadable cell yields [`INVALID_DATE`] and the record is kept.
pub fn normalize_due_date(cell: Option<&CellValue>) -> String {
    match normalize_cell(cell) {
        Some(date) => format_date(date),
        None => INVALID_DATE.to_string(),
    }
}

/// Resolve a cell to a calendar date, if possible.
///
/// Date cells are taken as-is; every other kind is coerced to a number and treated as a serial.
/// Text is coerced only if it parses as a number as a whole.
pub fn normalize_cell(cell: Option<&CellValue>) -> Option<NaiveDate> {
    match cell? {
        CellValue::Date(d) => Some(*d),
        CellValue::Number(n) => serial_to_date(*n),
        CellValue::Bool(b) => serial_to_date(if *b { 1.0 } else { 0.0 }),
        CellValue::Text(s) => s.trim().parse::<f64>().ok().and_then(serial_to_date),
    }
}

/// Convert a numeric day serial to a UTC calendar date using the linear epoch offset.
///
/// Returns `None` for non-finite serials or instants outside the representable range.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    let millis = (serial - UNIX_EPOCH_SERIAL) * MILLIS_PER_DAY;
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis.trunc() as i64).map(|dt| dt.date_naive())
}

/// Convert the serial of a cell the workbook formats as a date.
///
/// Unlike [`serial_to_date`], this honours the fictitious 1900-02-29 so that serials 1..=59
/// land on the date the spreadsheet displays.
pub fn date_cell_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.floor() as u64;
    let base = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    base.checked_add_days(Days::new(days))
}

/// Canonical output format for `DueDate`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
