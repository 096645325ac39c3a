//! Error types for slide generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading data or expanding a template.
#[derive(Error, Debug)]
pub enum Error {
    /// An input data file or template path does not exist.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The data source could not be parsed as tabular data.
    #[error("Unreadable tabular data: {0}")]
    Format(String),

    /// The requested spreadsheet sheet does not exist.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// The template is structurally unusable (no slides, no layouts, ...).
    #[error("Unusable template: {0}")]
    Template(String),

    /// A shape rejected a direct text write.
    ///
    /// The expander recovers from this by resetting the text frame.
    #[error("Text write rejected: {0}")]
    Write(String),

    /// The data source has no rows to expand.
    #[error("No data rows to expand")]
    EmptyData,

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or serialization error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),
}
