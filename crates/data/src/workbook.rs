//! Spreadsheet sources read through calamine.

use crate::header_names;
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::Timelike;
use pptgen_core::{Error, FieldValue, Record, Result, SheetSelector};
use std::path::Path;

/// Read one sheet of a workbook; the first used row is the header.
pub fn read_workbook(path: &Path, selector: Option<&SheetSelector>) -> Result<Vec<Record>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::Format(format!("Failed to open workbook {}: {}", path.display(), e)))?;

    let sheet = resolve_sheet(&workbook.sheet_names(), selector)?;
    log::debug!("Reading sheet '{}' from {}", sheet, path.display());

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| Error::Format(format!("Failed to read sheet '{}': {}", sheet, e)))?;

    Ok(records_from_range(&range))
}

/// Pick a sheet name. Names win over positions for numeric selectors.
pub fn resolve_sheet(names: &[String], selector: Option<&SheetSelector>) -> Result<String> {
    let found = match selector {
        None => names.first(),
        Some(SheetSelector::Name(name)) => names.iter().find(|n| *n == name),
        Some(SheetSelector::Index(index)) => names.get(*index),
        Some(SheetSelector::NameOrIndex(name, index)) => names
            .iter()
            .find(|n| *n == name)
            .or_else(|| names.get(*index)),
    };

    match (found, selector) {
        (Some(name), _) => Ok(name.clone()),
        (None, None) => Err(Error::SheetNotFound("workbook has no sheets".to_string())),
        (None, Some(selector)) => Err(Error::SheetNotFound(format!(
            "{} (available: {})",
            selector,
            names.join(", ")
        ))),
    }
}

/// Turn a sheet range into records, skipping rows with no values.
pub fn records_from_range(range: &Range<Data>) -> Vec<Record> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Vec::new();
    };

    let names = header_names(header.iter().map(|cell| match cell_value(cell) {
        FieldValue::Null => None,
        value => Some(value.render()),
    }));

    let records: Vec<Record> = rows
        .filter(|row| row.iter().any(|cell| !cell_value(cell).is_null()))
        .map(|row| {
            names
                .iter()
                .enumerate()
                .map(|(col, name)| {
                    let value = row.get(col).map(cell_value).unwrap_or(FieldValue::Null);
                    (name.clone(), value)
                })
                .collect()
        })
        .collect();

    log::debug!("Read {} sheet row(s) with {} column(s)", records.len(), names.len());
    records
}

/// Map one calamine cell onto a field value.
fn cell_value(cell: &Data) -> FieldValue {
    match cell {
        Data::Empty | Data::Error(_) => FieldValue::Null,
        Data::String(s) if s.is_empty() => FieldValue::Null,
        Data::String(s) => FieldValue::Text(s.clone()),
        Data::Int(i) => FieldValue::Int(*i),
        Data::Float(f) => FieldValue::Float(*f),
        Data::Bool(b) => FieldValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => FieldValue::Float(dt.as_f64()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.hour() == 0 && value.minute() == 0 && value.second() == 0 => {
                FieldValue::Text(value.format("%Y-%m-%d").to_string())
            }
            Some(value) => FieldValue::Text(value.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => FieldValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => FieldValue::Text(s.clone()),
    }
}
