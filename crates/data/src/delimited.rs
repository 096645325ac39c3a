//! Comma-separated text sources.

use crate::header_names;
use pptgen_core::{Error, FieldValue, Record, Result};
use std::io::Read;

/// Read CSV content whose first line is the header.
///
/// Cells stay text; empty cells become [`FieldValue::Null`] and short rows
/// are padded with nulls.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| Error::Format(format!("Failed to read CSV header: {}", e)))?
        .clone();
    if headers.is_empty() {
        return Err(Error::Format("CSV has no header row".to_string()));
    }

    let names = header_names(
        headers
            .iter()
            .enumerate()
            .map(|(idx, h)| if idx == 0 { h.trim_start_matches('\u{feff}') } else { h })
            .map(|h| (!h.is_empty()).then(|| h.to_string())),
    );

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row.map_err(|e| Error::Format(format!("Failed to read CSV row {}: {}", idx + 2, e)))?;
        if row.len() > names.len() {
            return Err(Error::Format(format!(
                "CSV row {} has {} fields but the header has {}",
                idx + 2,
                row.len(),
                names.len()
            )));
        }

        let record = names
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let value = match row.get(col) {
                    Some(cell) if !cell.is_empty() => FieldValue::Text(cell.to_string()),
                    _ => FieldValue::Null,
                };
                (name.clone(), value)
            })
            .collect();
        records.push(record);
    }

    log::debug!("Read {} CSV row(s) with {} column(s)", records.len(), names.len());
    Ok(records)
}
