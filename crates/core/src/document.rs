//! The capability contract the expander needs from a presentation backend.

use crate::Result;

/// How a shape carries text, resolved once when the slide is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// A shape with a text frame.
    PlainText,
    /// A table; text lives in its cells.
    Table,
    /// Pictures, connectors and anything else without editable text.
    Other,
}

/// A presentation whose slides can be enumerated, edited and replicated.
///
/// Slides, shapes and layouts are addressed by zero-based position.
/// Positions passed in must come from the matching `*_count` call.
pub trait SlideDocument {
    /// Number of slides, in presentation order.
    fn slide_count(&self) -> usize;

    /// Number of shapes on a slide, including shapes nested in groups.
    fn shape_count(&self, slide: usize) -> usize;

    /// Classify a shape.
    fn shape_kind(&self, slide: usize, shape: usize) -> ShapeKind;

    /// Text of a `PlainText` shape; `None` for other kinds.
    fn shape_text(&self, slide: usize, shape: usize) -> Option<String>;

    /// Replace a shape's text, keeping its formatting where possible.
    ///
    /// Fails with [`crate::Error::Write`] when the shape cannot take a
    /// direct write; callers then use [`SlideDocument::reset_text_frame`].
    fn set_shape_text(&mut self, slide: usize, shape: usize, text: &str) -> Result<()>;

    /// Clear a shape's text frame and write `text` as plain paragraphs.
    fn reset_text_frame(&mut self, slide: usize, shape: usize, text: &str) -> Result<()>;

    /// Grid size `(rows, columns)` of a `Table` shape.
    fn table_size(&self, slide: usize, shape: usize) -> Option<(usize, usize)>;

    /// Text of one table cell.
    fn cell_text(&self, slide: usize, shape: usize, row: usize, col: usize) -> Option<String>;

    /// Replace the text of one table cell.
    fn set_cell_text(
        &mut self,
        slide: usize,
        shape: usize,
        row: usize,
        col: usize,
        text: &str,
    ) -> Result<()>;

    /// Declared slide layout names, in declaration order.
    fn layout_names(&self) -> Vec<String>;

    /// Append a new slide built from a layout; returns its position.
    fn add_slide_from_layout(&mut self, layout: usize) -> Result<usize>;

    /// Copy a slide's shape structure (geometry and style included) onto a
    /// freshly added slide inserted at `position`.
    fn duplicate_slide(&mut self, source: usize, position: usize) -> Result<()>;
}
