//! Reading and writing DrawingML text bodies (`p:txBody`, `a:txBody`).
//!
//! Paragraphs read as lines joined by `\n`; a line break (`a:br`) inside a
//! paragraph reads as a vertical tab, the same way it is written back.

use crate::xml::{qualified, XmlElement, XmlNode};
use pptgen_core::{Error, Result};

/// Character standing for an in-paragraph line break.
pub const LINE_BREAK: char = '\u{b}';

/// Plain text of a text body.
pub fn read_text(body: &XmlElement) -> String {
    body.children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut text = String::new();
    for child in paragraph.elements() {
        match child.local_name() {
            "r" | "fld" => {
                if let Some(t) = child.child("t") {
                    text.push_str(&t.text());
                }
            }
            "br" => text.push(LINE_BREAK),
            _ => {}
        }
    }
    text
}

/// Formatting lifted from the first paragraph and run of a text body.
struct TextStyle {
    prefix: Option<String>,
    paragraph_props: Option<XmlElement>,
    run_props: Option<XmlElement>,
    end_props: Option<XmlElement>,
}

impl TextStyle {
    fn plain(prefix: Option<String>) -> Self {
        Self {
            prefix,
            paragraph_props: None,
            run_props: None,
            end_props: None,
        }
    }

    fn paragraph(&self, line: &str) -> XmlElement {
        let prefix = self.prefix.as_deref();
        let mut paragraph = XmlElement::new(qualified(prefix, "p"));
        if let Some(props) = &self.paragraph_props {
            paragraph = paragraph.with_child(props.clone());
        }

        for (idx, segment) in line.split(LINE_BREAK).enumerate() {
            if idx > 0 {
                let mut br = XmlElement::new(qualified(prefix, "br"));
                if let Some(props) = &self.run_props {
                    br = br.with_child(props.clone());
                }
                paragraph = paragraph.with_child(br);
            }
            if segment.is_empty() {
                continue;
            }
            let mut run = XmlElement::new(qualified(prefix, "r"));
            if let Some(props) = &self.run_props {
                run = run.with_child(props.clone());
            }
            run = run.with_child(XmlElement::new(qualified(prefix, "t")).with_text(segment));
            paragraph = paragraph.with_child(run);
        }

        if let Some(props) = &self.end_props {
            paragraph = paragraph.with_child(props.clone());
        }
        paragraph
    }
}

/// Replace the text of a body, keeping the first paragraph's and first
/// run's formatting for every new paragraph.
///
/// Fails with [`Error::Write`] when the body has no paragraph to take the
/// formatting from.
pub fn write_text(body: &mut XmlElement, text: &str) -> Result<()> {
    let first = body
        .child("p")
        .ok_or_else(|| Error::Write("text body has no paragraph".to_string()))?;

    let first_run_props = first
        .elements()
        .filter(|e| matches!(e.local_name(), "r" | "fld"))
        .find_map(|run| run.child("rPr"))
        .cloned();
    let style = TextStyle {
        prefix: first.prefix().map(str::to_string),
        paragraph_props: first.child("pPr").cloned(),
        run_props: first_run_props,
        end_props: first.child("endParaRPr").cloned(),
    };

    replace_paragraphs(body, &style, text);
    Ok(())
}

/// Clear a body and write `text` as unformatted paragraphs.
///
/// A body without `bodyPr` gets one, since the schema requires it.
pub fn reset_text(body: &mut XmlElement, text: &str) {
    let prefix = body
        .elements()
        .find(|e| matches!(e.local_name(), "bodyPr" | "lstStyle" | "p"))
        .and_then(XmlElement::prefix)
        .unwrap_or("a")
        .to_string();

    if body.child("bodyPr").is_none() {
        body.children
            .insert(0, XmlNode::Element(XmlElement::new(qualified(Some(&prefix), "bodyPr"))));
    }
    replace_paragraphs(body, &TextStyle::plain(Some(prefix)), text);
}

/// A fresh table-cell text body (`a:txBody`) holding `text`.
pub fn new_cell_body(prefix: Option<&str>, text: &str) -> XmlElement {
    let mut body = XmlElement::new(qualified(prefix, "txBody"))
        .with_child(XmlElement::new(qualified(prefix, "bodyPr")))
        .with_child(XmlElement::new(qualified(prefix, "lstStyle")));
    replace_paragraphs(&mut body, &TextStyle::plain(prefix.map(str::to_string)), text);
    body
}

fn replace_paragraphs(body: &mut XmlElement, style: &TextStyle, text: &str) {
    body.remove_children("p");
    // Paragraphs close the body; only extLst may follow them.
    let insert_at = body
        .children
        .iter()
        .position(|node| matches!(node, XmlNode::Element(e) if e.local_name() == "extLst"))
        .unwrap_or(body.children.len());
    let paragraphs = text
        .split('\n')
        .map(|line| XmlNode::Element(style.paragraph(line)));
    body.children.splice(insert_at..insert_at, paragraphs);
}
