//! Tabular data loading for slide generation.
//!
//! Reads CSV files and spreadsheet sheets into ordered [`Record`]s whose
//! field names come from the header row. Row order is preserved.

pub mod delimited;
pub mod workbook;

use pptgen_core::{Error, Record, Result, SheetSelector};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// The kind of tabular source, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Comma-separated text.
    Delimited,
    /// Spreadsheet workbook (xlsx, xlsm, xlsb, xls, ods).
    Workbook,
}

impl SourceKind {
    /// Detect the source kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" | "txt" => Some(Self::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Loads records from CSV files or spreadsheet sheets.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataLoader;

impl DataLoader {
    /// Create a new loader.
    pub fn new() -> Self {
        Self
    }

    /// Load every data row of `path` as a record.
    ///
    /// `sheet` selects a spreadsheet sheet and is ignored for CSV input.
    pub fn load(&self, path: &Path, sheet: Option<&SheetSelector>) -> Result<Vec<Record>> {
        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }

        let kind = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(SourceKind::from_extension)
            .ok_or_else(|| {
                Error::Format(format!(
                    "{} is neither a CSV file nor a spreadsheet",
                    path.display()
                ))
            })?;

        match kind {
            SourceKind::Delimited => {
                if let Some(sheet) = sheet {
                    log::warn!("Ignoring sheet selector {} for CSV input", sheet);
                }
                log::debug!("Loading CSV data from {}", path.display());
                let file = File::open(path)?;
                delimited::read_csv(BufReader::new(file))
            }
            SourceKind::Workbook => {
                log::debug!("Loading spreadsheet data from {}", path.display());
                workbook::read_workbook(path, sheet)
            }
        }
    }
}

/// Turn header cells into field names; blank headers get a positional name.
pub(crate) fn header_names<I>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    headers
        .into_iter()
        .enumerate()
        .map(|(idx, name)| name.unwrap_or_else(|| format!("Unnamed: {}", idx)))
        .collect()
}
