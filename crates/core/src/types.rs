//! Domain types for tabular records and extracted slide content.

use serde::Serialize;
use std::fmt;

/// A single scalar cell value from a data source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldValue {
    /// Empty or explicitly missing cell.
    Null,
    /// Text content, kept exactly as read.
    Text(String),
    /// Whole number.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean cell.
    Bool(bool),
}

impl FieldValue {
    /// Whether this value is absent.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render the value the way it is written into a slide.
    ///
    /// Absent values and non-finite floats render as the empty string.
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => render_float(*f),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Spreadsheets store every number as a float; integral values print without ".0".
fn render_float(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// One source row: ordered (field name, value) pairs.
///
/// Field names come from the header row and are not deduplicated;
/// [`Record::get`] returns the last column with a given name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Append a field.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Look up a field by exact name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .rev()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Whether a field with this exact name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }

    /// Field names in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Fields in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Which sheet of a workbook to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SheetSelector {
    /// Sheet with this exact name.
    Name(String),
    /// Zero-based sheet position.
    Index(usize),
    /// Name if such a sheet exists, otherwise the zero-based position.
    NameOrIndex(String, usize),
}

impl SheetSelector {
    /// Interpret a command-line sheet argument.
    ///
    /// Purely numeric input may name a sheet ("2025") or point at one by
    /// position; the loader tries the name first.
    pub fn parse(value: &str) -> Self {
        match value.parse::<usize>() {
            Ok(index) => Self::NameOrIndex(value.to_string(), index),
            Err(_) => Self::Name(value.to_string()),
        }
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) | Self::NameOrIndex(name, _) => write!(f, "'{}'", name),
            Self::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// Text read back from one slide of a presentation.
#[derive(Debug, Clone, Serialize)]
pub struct SlideText {
    /// 1-based slide number.
    pub number: usize,

    /// Non-blank text blocks in document order (shapes, then cells row by row).
    pub blocks: Vec<String>,

    /// Distinct `{field}` tokens found on the slide, in order of appearance.
    pub placeholders: Vec<String>,
}

impl SlideText {
    /// Create an empty slide text with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            blocks: Vec::new(),
            placeholders: Vec::new(),
        }
    }

    /// Add a text block, collecting its tokens. Blank blocks are skipped.
    pub fn add_block(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.trim().is_empty() {
            return;
        }
        for token in crate::placeholder::placeholders_in(&text) {
            if !self.placeholders.iter().any(|t| *t == token) {
                self.placeholders.push(token);
            }
        }
        self.blocks.push(text);
    }
}
