use std::io::Cursor;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use chrono::NaiveDate;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{CellValue, RawRow};

use super::dates::date_cell_to_date;

/// Header used for columns whose header cell is empty.
const EMPTY_HEADER: &str = "__EMPTY";

/// Decode an in-memory workbook (`.xlsx`, `.xls`, `.xlsb`, `.ods`) into header-keyed rows.
///
/// Behavior:
/// - Uses the first sheet by position; sheet names are ignored
/// - The first row of the sheet's used range is the header row
/// - Empty cells are omitted from a row; rows with no cells at all are dropped
/// - Duplicate headers get a `_1`, `_2`, ... suffix; blank headers become `__EMPTY`
pub fn decode_workbook(bytes: &[u8]) -> IngestionResult<Vec<RawRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestionError::Parse {
            message: "workbook has no sheets".to_string(),
        })??;

    Ok(rows_from_range(&range))
}

fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let mut rows_iter = range.rows();
    let headers = match rows_iter.next() {
        Some(header_row) => build_headers(header_row),
        None => return Vec::new(),
    };

    let mut rows = Vec::new();
    for row in rows_iter {
        let mut out = RawRow::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if let Some(value) = convert_cell(cell) {
                out.insert(header.as_str(), value);
            }
        }
        if !out.is_empty() {
            rows.push(out);
        }
    }
    rows
}

fn build_headers(row: &[Data]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(row.len());
    for cell in row {
        let raw = cell_to_header_string(cell);
        let base = if raw.is_empty() {
            EMPTY_HEADER.to_string()
        } else {
            raw
        };

        let mut name = base.clone();
        let mut n = 0usize;
        while headers.contains(&name) {
            n += 1;
            name = format!("{base}_{n}");
        }
        headers.push(name);
    }
    headers
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => CellValue::Number(*f).to_text(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()).to_text(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}

fn convert_cell(c: &Data) -> Option<CellValue> {
    let value = match c {
        Data::Empty => return None,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match date_cell_to_date(serial) {
                Some(date) if !dt.is_duration() => CellValue::Date(date),
                _ => CellValue::Number(serial),
            }
        }
        Data::DateTimeIso(s) => match parse_iso_date(s) {
            Some(date) => CellValue::Date(date),
            None => CellValue::Text(s.clone()),
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    };
    Some(value)
}

fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let date_part = s.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
