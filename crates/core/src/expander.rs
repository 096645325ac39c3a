//! Template expansion: fill slides from records and replicate pattern slides.

use crate::document::{ShapeKind, SlideDocument};
use crate::placeholder::substitute;
use crate::{Error, Record, Result};

/// How records map onto slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionMode {
    /// One copy of the pattern slide per record; the first record fills the
    /// pattern itself.
    #[default]
    Duplicate,
    /// One new slide per record, built from a slide layout.
    Layout,
    /// The first record fills every existing slide (summary decks).
    Fill,
    /// All records fill every existing slide once, record `i` (1-based)
    /// answering `{<field>_<i>}` tokens; for fixed-row table templates.
    Numbered,
}

/// Which layout new slides are built from in [`ExpansionMode::Layout`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LayoutChoice {
    /// The second declared layout if there is more than one, else the first.
    #[default]
    Default,
    /// The layout with exactly this declared name.
    Named(String),
}

/// Counters for the writes performed while filling slides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    /// Text shapes whose text changed.
    pub shapes_written: usize,
    /// Table cells whose text changed.
    pub cells_written: usize,
    /// Shape writes that needed the text-frame reset fallback.
    pub fallback_writes: usize,
}

impl FillStats {
    fn merge(&mut self, other: FillStats) {
        self.shapes_written += other.shapes_written;
        self.cells_written += other.cells_written;
        self.fallback_writes += other.fallback_writes;
    }
}

/// Result of a whole expansion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSummary {
    /// Zero-based positions of the slides that received a record, in record order.
    pub slides: Vec<usize>,
    /// Accumulated write counters.
    pub stats: FillStats,
}

/// Expands a template document with a sequence of records.
#[derive(Debug, Clone)]
pub struct TemplateExpander {
    mode: ExpansionMode,
    layout: LayoutChoice,
    /// 1-based pattern slide for duplicate mode.
    pattern_slide: usize,
}

impl Default for TemplateExpander {
    fn default() -> Self {
        Self {
            mode: ExpansionMode::default(),
            layout: LayoutChoice::default(),
            pattern_slide: 1,
        }
    }
}

impl TemplateExpander {
    /// Create an expander in duplicate mode using slide 1 as the pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expansion mode.
    pub fn with_mode(mut self, mode: ExpansionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the layout used by layout mode.
    pub fn with_layout(mut self, layout: LayoutChoice) -> Self {
        self.layout = layout;
        self
    }

    /// Set the 1-based pattern slide used by duplicate mode.
    pub fn with_pattern_slide(mut self, slide: usize) -> Self {
        self.pattern_slide = slide.max(1);
        self
    }

    /// Apply every record to the document according to the configured mode.
    pub fn expand<D: SlideDocument>(
        &self,
        doc: &mut D,
        records: &[Record],
    ) -> Result<ExpansionSummary> {
        log::debug!(
            "Expanding {} record(s) in {:?} mode over {} template slide(s)",
            records.len(),
            self.mode,
            doc.slide_count()
        );
        match self.mode {
            ExpansionMode::Duplicate => self.expand_duplicate(doc, records),
            ExpansionMode::Layout => self.expand_from_layout(doc, records),
            ExpansionMode::Fill => self.expand_fill(doc, records),
            ExpansionMode::Numbered => self.expand_numbered(doc, records),
        }
    }

    fn expand_duplicate<D: SlideDocument>(
        &self,
        doc: &mut D,
        records: &[Record],
    ) -> Result<ExpansionSummary> {
        let pattern = self.pattern_index(doc)?;
        if records.is_empty() {
            return Err(Error::EmptyData);
        }

        // Copies are taken before the pattern is filled so each one starts
        // from the unpopulated template.
        for offset in 1..records.len() {
            doc.duplicate_slide(pattern, pattern + offset)?;
        }

        let mut summary = ExpansionSummary::default();
        for (offset, record) in records.iter().enumerate() {
            let slide = pattern + offset;
            summary.stats.merge(fill_slide(doc, slide, record)?);
            summary.slides.push(slide);
        }
        Ok(summary)
    }

    fn expand_from_layout<D: SlideDocument>(
        &self,
        doc: &mut D,
        records: &[Record],
    ) -> Result<ExpansionSummary> {
        let layout = self.resolve_layout(&doc.layout_names())?;

        let mut summary = ExpansionSummary::default();
        for record in records {
            let slide = doc.add_slide_from_layout(layout)?;
            summary.stats.merge(fill_slide(doc, slide, record)?);
            summary.slides.push(slide);
        }
        Ok(summary)
    }

    fn expand_fill<D: SlideDocument>(
        &self,
        doc: &mut D,
        records: &[Record],
    ) -> Result<ExpansionSummary> {
        if doc.slide_count() == 0 {
            return Err(Error::Template("template has no slides to fill".to_string()));
        }
        let record = records.first().ok_or(Error::EmptyData)?;
        if records.len() > 1 {
            log::warn!(
                "Fill mode uses only the first record; ignoring {} more",
                records.len() - 1
            );
        }

        let mut summary = ExpansionSummary::default();
        for slide in 0..doc.slide_count() {
            summary.stats.merge(fill_slide(doc, slide, record)?);
            summary.slides.push(slide);
        }
        Ok(summary)
    }

    fn expand_numbered<D: SlideDocument>(
        &self,
        doc: &mut D,
        records: &[Record],
    ) -> Result<ExpansionSummary> {
        if doc.slide_count() == 0 {
            return Err(Error::Template("template has no slides to fill".to_string()));
        }
        if records.is_empty() {
            return Err(Error::EmptyData);
        }
        let record = numbered_record(records);
        log::debug!(
            "Folded {} record(s) into {} numbered field(s)",
            records.len(),
            record.len()
        );

        let mut summary = ExpansionSummary::default();
        for slide in 0..doc.slide_count() {
            summary.stats.merge(fill_slide(doc, slide, &record)?);
            summary.slides.push(slide);
        }
        Ok(summary)
    }

    fn pattern_index<D: SlideDocument>(&self, doc: &D) -> Result<usize> {
        let count = doc.slide_count();
        if count == 0 {
            return Err(Error::Template(
                "template has no slides; a pattern slide is required".to_string(),
            ));
        }
        if self.pattern_slide > count {
            return Err(Error::Template(format!(
                "pattern slide {} does not exist (template has {} slide(s))",
                self.pattern_slide, count
            )));
        }
        Ok(self.pattern_slide - 1)
    }

    /// Pick the layout index for new slides from the declared layout names.
    pub fn resolve_layout(&self, names: &[String]) -> Result<usize> {
        if names.is_empty() {
            return Err(Error::Template("template declares no slide layouts".to_string()));
        }
        match &self.layout {
            LayoutChoice::Default => Ok(if names.len() > 1 { 1 } else { 0 }),
            LayoutChoice::Named(wanted) => names
                .iter()
                .position(|name| name == wanted)
                .ok_or_else(|| {
                    Error::Template(format!(
                        "no layout named '{}' (available: {})",
                        wanted,
                        names.join(", ")
                    ))
                }),
        }
    }
}

/// Fold records into one, naming each field `<field>_<row>` with a 1-based
/// row number. Spaces in field names become underscores, so the `Project
/// Name` of the second record answers `{Project_Name_2}`.
pub fn numbered_record(records: &[Record]) -> Record {
    records
        .iter()
        .enumerate()
        .flat_map(|(idx, record)| {
            record.iter().map(move |(name, value)| {
                let numbered = format!("{}_{}", name.replace(' ', "_"), idx + 1);
                (numbered, value.clone())
            })
        })
        .collect()
}

/// Substitute one record into every text shape and table cell of a slide.
///
/// Text that contains no matching token is left alone; no write is issued.
pub fn fill_slide<D: SlideDocument>(doc: &mut D, slide: usize, record: &Record) -> Result<FillStats> {
    let mut stats = FillStats::default();

    for shape in 0..doc.shape_count(slide) {
        match doc.shape_kind(slide, shape) {
            ShapeKind::PlainText => {
                let Some(text) = doc.shape_text(slide, shape) else {
                    continue;
                };
                let Some(filled) = substitute(&text, record) else {
                    continue;
                };
                match doc.set_shape_text(slide, shape, &filled) {
                    Ok(()) => {}
                    Err(Error::Write(reason)) => {
                        log::debug!(
                            "Slide {} shape {}: direct write rejected ({}), resetting text frame",
                            slide + 1,
                            shape,
                            reason
                        );
                        doc.reset_text_frame(slide, shape, &filled)?;
                        stats.fallback_writes += 1;
                    }
                    Err(e) => return Err(e),
                }
                stats.shapes_written += 1;
            }
            ShapeKind::Table => {
                let Some((rows, cols)) = doc.table_size(slide, shape) else {
                    continue;
                };
                for row in 0..rows {
                    for col in 0..cols {
                        let Some(text) = doc.cell_text(slide, shape, row, col) else {
                            continue;
                        };
                        if let Some(filled) = substitute(&text, record) {
                            doc.set_cell_text(slide, shape, row, col, &filled)?;
                            stats.cells_written += 1;
                        }
                    }
                }
            }
            ShapeKind::Other => {}
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldValue;

    #[derive(Debug, Clone, PartialEq)]
    enum MockShape {
        Text { text: String, rejects_direct: bool },
        Table(Vec<Vec<String>>),
        Picture,
    }

    fn text(s: &str) -> MockShape {
        MockShape::Text {
            text: s.to_string(),
            rejects_direct: false,
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct MockSlide {
        shapes: Vec<MockShape>,
        layout: Option<usize>,
    }

    #[derive(Debug, Default)]
    struct MockDoc {
        slides: Vec<MockSlide>,
        layouts: Vec<(String, Vec<MockShape>)>,
        writes: usize,
    }

    impl MockDoc {
        fn with_slide(shapes: Vec<MockShape>) -> Self {
            Self {
                slides: vec![MockSlide { shapes, layout: None }],
                ..Default::default()
            }
        }

        fn texts(&self, slide: usize) -> Vec<String> {
            self.slides[slide]
                .shapes
                .iter()
                .filter_map(|s| match s {
                    MockShape::Text { text, .. } => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl SlideDocument for MockDoc {
        fn slide_count(&self) -> usize {
            self.slides.len()
        }

        fn shape_count(&self, slide: usize) -> usize {
            self.slides[slide].shapes.len()
        }

        fn shape_kind(&self, slide: usize, shape: usize) -> ShapeKind {
            match self.slides[slide].shapes[shape] {
                MockShape::Text { .. } => ShapeKind::PlainText,
                MockShape::Table(_) => ShapeKind::Table,
                MockShape::Picture => ShapeKind::Other,
            }
        }

        fn shape_text(&self, slide: usize, shape: usize) -> Option<String> {
            match &self.slides[slide].shapes[shape] {
                MockShape::Text { text, .. } => Some(text.clone()),
                _ => None,
            }
        }

        fn set_shape_text(&mut self, slide: usize, shape: usize, new: &str) -> Result<()> {
            match &mut self.slides[slide].shapes[shape] {
                MockShape::Text { rejects_direct: true, .. } => {
                    Err(Error::Write("read-only".to_string()))
                }
                MockShape::Text { text, .. } => {
                    *text = new.to_string();
                    self.writes += 1;
                    Ok(())
                }
                _ => Err(Error::Write("not a text shape".to_string())),
            }
        }

        fn reset_text_frame(&mut self, slide: usize, shape: usize, new: &str) -> Result<()> {
            self.slides[slide].shapes[shape] = text(new);
            self.writes += 1;
            Ok(())
        }

        fn table_size(&self, slide: usize, shape: usize) -> Option<(usize, usize)> {
            match &self.slides[slide].shapes[shape] {
                MockShape::Table(rows) => Some((rows.len(), rows.first().map_or(0, Vec::len))),
                _ => None,
            }
        }

        fn cell_text(&self, slide: usize, shape: usize, row: usize, col: usize) -> Option<String> {
            match &self.slides[slide].shapes[shape] {
                MockShape::Table(rows) => rows.get(row)?.get(col).cloned(),
                _ => None,
            }
        }

        fn set_cell_text(
            &mut self,
            slide: usize,
            shape: usize,
            row: usize,
            col: usize,
            new: &str,
        ) -> Result<()> {
            if let MockShape::Table(rows) = &mut self.slides[slide].shapes[shape] {
                rows[row][col] = new.to_string();
                self.writes += 1;
            }
            Ok(())
        }

        fn layout_names(&self) -> Vec<String> {
            self.layouts.iter().map(|(name, _)| name.clone()).collect()
        }

        fn add_slide_from_layout(&mut self, layout: usize) -> Result<usize> {
            let shapes = self.layouts[layout].1.clone();
            self.slides.push(MockSlide {
                shapes,
                layout: Some(layout),
            });
            Ok(self.slides.len() - 1)
        }

        fn duplicate_slide(&mut self, source: usize, position: usize) -> Result<()> {
            let copy = self.slides[source].clone();
            self.slides.insert(position, copy);
            Ok(())
        }
    }

    fn client_rev(client: &str, rev: FieldValue) -> Record {
        Record::new().with("Client", client).with("Rev", rev)
    }

    #[test]
    fn test_fill_slide_scenario() {
        let mut doc = MockDoc::with_slide(vec![text("Client: {Client}, Revenue: {Rev}")]);
        fill_slide(&mut doc, 0, &client_rev("Acme", FieldValue::Int(1000))).unwrap();
        assert_eq!(doc.texts(0), vec!["Client: Acme, Revenue: 1000"]);

        let mut doc = MockDoc::with_slide(vec![text("Client: {Client}, Revenue: {Rev}")]);
        fill_slide(&mut doc, 0, &client_rev("Acme", FieldValue::Null)).unwrap();
        assert_eq!(doc.texts(0), vec!["Client: Acme, Revenue: "]);
    }

    #[test]
    fn test_no_match_performs_no_write() {
        let mut doc = MockDoc::with_slide(vec![
            text("Quarterly review"),
            text("{Unknown}"),
            MockShape::Picture,
        ]);
        let stats = fill_slide(&mut doc, 0, &client_rev("Acme", FieldValue::Null)).unwrap();
        assert_eq!(stats, FillStats::default());
        assert_eq!(doc.writes, 0);
        assert_eq!(doc.texts(0), vec!["Quarterly review", "{Unknown}"]);
    }

    #[test]
    fn test_rejected_write_falls_back_to_reset() {
        let mut doc = MockDoc::with_slide(vec![MockShape::Text {
            text: "{Client}".to_string(),
            rejects_direct: true,
        }]);
        let stats = fill_slide(&mut doc, 0, &client_rev("Acme", FieldValue::Null)).unwrap();
        assert_eq!(stats.fallback_writes, 1);
        assert_eq!(stats.shapes_written, 1);
        assert_eq!(doc.texts(0), vec!["Acme"]);
    }

    #[test]
    fn test_table_cells_filled_independently() {
        let header = ["Client", "Project Name", "Days to Sign", "Revenue"];
        let row = ["{Client_1}", "{Project_Name_1}", "{Days_to_Sign_1}", "{Revenue_1}"];
        let table = vec![
            header.iter().map(|s| s.to_string()).collect(),
            row.iter().map(|s| s.to_string()).collect(),
        ];
        let mut doc = MockDoc::with_slide(vec![MockShape::Table(table)]);
        let record = Record::new().with("Client_1", "Acme Corp");

        let stats = fill_slide(&mut doc, 0, &record).unwrap();
        assert_eq!(stats.cells_written, 1);

        let MockShape::Table(rows) = &doc.slides[0].shapes[0] else {
            panic!("table expected");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            vec!["Acme Corp", "{Project_Name_1}", "{Days_to_Sign_1}", "{Revenue_1}"]
        );
        assert_eq!(rows[0], header.to_vec());
    }

    #[test]
    fn test_duplicate_mode_one_slide_per_record_in_order() {
        let mut doc = MockDoc::with_slide(vec![text("{Client}"), MockShape::Picture, text("Rev {Rev}")]);
        let records = vec![
            client_rev("Acme", FieldValue::Int(1)),
            client_rev("Globex", FieldValue::Int(2)),
            client_rev("Initech", FieldValue::Null),
        ];

        let summary = TemplateExpander::new().expand(&mut doc, &records).unwrap();
        assert_eq!(summary.slides, vec![0, 1, 2]);
        assert_eq!(doc.slide_count(), 3);
        for slide in &doc.slides {
            assert_eq!(slide.shapes.len(), 3);
        }
        assert_eq!(doc.texts(0), vec!["Acme", "Rev 1"]);
        assert_eq!(doc.texts(1), vec!["Globex", "Rev 2"]);
        assert_eq!(doc.texts(2), vec!["Initech", "Rev "]);
    }

    #[test]
    fn test_duplicate_mode_keeps_other_slides() {
        let mut doc = MockDoc::with_slide(vec![text("Cover")]);
        doc.slides.push(MockSlide {
            shapes: vec![text("{Client}")],
            layout: None,
        });
        doc.slides.push(MockSlide {
            shapes: vec![text("Thanks {Client}")],
            layout: None,
        });
        let records = vec![
            client_rev("Acme", FieldValue::Null),
            client_rev("Globex", FieldValue::Null),
        ];

        TemplateExpander::new()
            .with_pattern_slide(2)
            .expand(&mut doc, &records)
            .unwrap();
        assert_eq!(doc.slide_count(), 4);
        assert_eq!(doc.texts(0), vec!["Cover"]);
        assert_eq!(doc.texts(1), vec!["Acme"]);
        assert_eq!(doc.texts(2), vec!["Globex"]);
        assert_eq!(doc.texts(3), vec!["Thanks {Client}"]);
    }

    #[test]
    fn test_duplicate_mode_errors() {
        let mut empty = MockDoc::default();
        let records = vec![client_rev("Acme", FieldValue::Null)];
        assert!(matches!(
            TemplateExpander::new().expand(&mut empty, &records),
            Err(Error::Template(_))
        ));

        let mut doc = MockDoc::with_slide(vec![text("{Client}")]);
        assert!(matches!(
            TemplateExpander::new().with_pattern_slide(3).expand(&mut doc, &records),
            Err(Error::Template(_))
        ));
        assert!(matches!(
            TemplateExpander::new().expand(&mut doc, &[]),
            Err(Error::EmptyData)
        ));
        assert_eq!(doc.texts(0), vec!["{Client}"]);
    }

    #[test]
    fn test_layout_mode_default_picks_second_layout() {
        let mut doc = MockDoc {
            layouts: vec![
                ("Title Slide".to_string(), vec![text("Title")]),
                ("Title and Content".to_string(), vec![text("{Client}")]),
            ],
            ..Default::default()
        };
        let records = vec![
            client_rev("Acme", FieldValue::Null),
            client_rev("Globex", FieldValue::Null),
        ];

        let summary = TemplateExpander::new()
            .with_mode(ExpansionMode::Layout)
            .expand(&mut doc, &records)
            .unwrap();
        assert_eq!(summary.slides, vec![0, 1]);
        assert!(doc.slides.iter().all(|s| s.layout == Some(1)));
        assert_eq!(doc.texts(0), vec!["Acme"]);
        assert_eq!(doc.texts(1), vec!["Globex"]);
    }

    #[test]
    fn test_resolve_layout() {
        let one = vec!["Only".to_string()];
        let many = vec!["Title Slide".to_string(), "Content".to_string(), "Blank".to_string()];
        let expander = TemplateExpander::new();
        assert_eq!(expander.resolve_layout(&one).unwrap(), 0);
        assert_eq!(expander.resolve_layout(&many).unwrap(), 1);
        assert!(matches!(expander.resolve_layout(&[]), Err(Error::Template(_))));

        let named = TemplateExpander::new().with_layout(LayoutChoice::Named("Blank".to_string()));
        assert_eq!(named.resolve_layout(&many).unwrap(), 2);
        let missing = TemplateExpander::new().with_layout(LayoutChoice::Named("blank".to_string()));
        match missing.resolve_layout(&many) {
            Err(Error::Template(msg)) => assert!(msg.contains("Title Slide, Content, Blank")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_numbered_record_names() {
        let records = vec![
            Record::new().with("Client", "Acme").with("Project Name", "Portal"),
            Record::new().with("Client", "Globex").with("Project Name", FieldValue::Null),
        ];
        let folded = numbered_record(&records);
        assert_eq!(
            folded.names().collect::<Vec<_>>(),
            vec!["Client_1", "Project_Name_1", "Client_2", "Project_Name_2"]
        );
        assert_eq!(folded.get("Client_2"), Some(&FieldValue::from("Globex")));
        assert_eq!(folded.get("Project_Name_2"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_numbered_mode_fills_table_rows() {
        let rows = [
            ["Client", "Project Name"],
            ["{Client_1}", "{Project_Name_1}"],
            ["{Client_2}", "{Project_Name_2}"],
            ["{Client_3}", "{Project_Name_3}"],
        ];
        let table = rows
            .iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect();
        let mut doc = MockDoc::with_slide(vec![text("{Client_1} leads"), MockShape::Table(table)]);
        let records = vec![
            Record::new().with("Client", "Acme").with("Project Name", "Portal"),
            Record::new().with("Client", "Globex").with("Project Name", "Audit"),
        ];

        let summary = TemplateExpander::new()
            .with_mode(ExpansionMode::Numbered)
            .expand(&mut doc, &records)
            .unwrap();
        assert_eq!(summary.slides, vec![0]);
        assert_eq!(summary.stats.cells_written, 4);
        assert_eq!(doc.slide_count(), 1);
        assert_eq!(doc.texts(0), vec!["Acme leads"]);

        let MockShape::Table(filled) = &doc.slides[0].shapes[1] else {
            panic!("table expected");
        };
        assert_eq!(filled[1], vec!["Acme", "Portal"]);
        assert_eq!(filled[2], vec!["Globex", "Audit"]);
        // Rows past the data keep their tokens.
        assert_eq!(filled[3], vec!["{Client_3}", "{Project_Name_3}"]);
    }

    #[test]
    fn test_numbered_mode_errors() {
        let records = vec![Record::new().with("Client", "Acme")];
        let numbered = TemplateExpander::new().with_mode(ExpansionMode::Numbered);
        assert!(matches!(
            numbered.expand(&mut MockDoc::default(), &records),
            Err(Error::Template(_))
        ));
        let mut doc = MockDoc::with_slide(vec![text("{Client_1}")]);
        assert!(matches!(numbered.expand(&mut doc, &[]), Err(Error::EmptyData)));
    }

    #[test]
    fn test_fill_mode_uses_first_record_on_every_slide() {
        let mut doc = MockDoc::with_slide(vec![text("Total: {Total Revenue}")]);
        doc.slides.push(MockSlide {
            shapes: vec![text("Top client: {Top Client}")],
            layout: None,
        });
        let records = vec![
            Record::new().with("Total Revenue", "$10.00").with("Top Client", "Acme"),
            Record::new().with("Total Revenue", "ignored"),
        ];

        let summary = TemplateExpander::new()
            .with_mode(ExpansionMode::Fill)
            .expand(&mut doc, &records)
            .unwrap();
        assert_eq!(summary.slides, vec![0, 1]);
        assert_eq!(doc.slide_count(), 2);
        assert_eq!(doc.texts(0), vec!["Total: $10.00"]);
        assert_eq!(doc.texts(1), vec!["Top client: Acme"]);
    }
}
