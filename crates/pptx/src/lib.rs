//! PPTX (Office Open XML) backend for template expansion.
//!
//! A `.pptx` or `.potx` file is a ZIP archive of XML parts. [`PptxDocument`]
//! loads every part into memory, edits slides through a small element tree
//! and writes the archive back out.

pub mod document;
pub mod package;
pub mod rels;
pub mod text;
pub mod xml;

#[cfg(any(test, feature = "test-fixtures"))]
#[doc(hidden)]
pub mod fixture;

pub use document::PptxDocument;
