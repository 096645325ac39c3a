//! Core records, placeholder substitution and template expansion for
//! generating slide decks from tabular data.

pub mod document;
pub mod error;
pub mod expander;
pub mod placeholder;
pub mod types;

pub use document::{ShapeKind, SlideDocument};
pub use error::{Error, Result};
pub use expander::{fill_slide, numbered_record, ExpansionMode, ExpansionSummary, FillStats, LayoutChoice, TemplateExpander};
pub use types::{FieldValue, Record, SheetSelector, SlideText};
