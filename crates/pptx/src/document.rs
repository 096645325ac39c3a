//! Editable PPTX presentation implementing [`SlideDocument`].

use crate::package::{ContentTypes, Package, SLIDE_CONTENT_TYPE};
use crate::rels::{
    self, extract_slide_number, relative_target, rels_path_for, resolve_target, Relationships,
};
use crate::text::{new_cell_body, read_text, reset_text, write_text};
use crate::xml::{qualified, XmlDocument, XmlElement, XmlNode};
use pptgen_core::placeholder::placeholders_in;
use pptgen_core::{Error, Result, ShapeKind, SlideDocument, SlideText};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Slide skeleton for slides built from a layout; shapes go into `p:spTree`.
const BLANK_SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#;

/// Layout placeholders that are not copied onto new slides.
const SKIPPED_PLACEHOLDERS: &[&str] = &["dt", "ftr", "sldNum"];

/// One slide part with its relationships.
#[derive(Debug, Clone)]
struct SlidePart {
    path: String,
    xml: XmlDocument,
    rels: Relationships,
}

impl SlidePart {
    fn tree(&self) -> Option<&XmlElement> {
        self.xml.root.descend(&["cSld", "spTree"])
    }

    fn tree_mut(&mut self) -> Option<&mut XmlElement> {
        self.xml.root.descend_mut(&["cSld", "spTree"])
    }

    /// Child-index paths (relative to `p:spTree`) of every shape, groups flattened.
    fn shape_paths(&self) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        if let Some(tree) = self.tree() {
            collect_shapes(tree, &mut Vec::new(), &mut paths);
        }
        paths
    }

    fn shape(&self, shape: usize) -> Option<&XmlElement> {
        let path = self.shape_paths().into_iter().nth(shape)?;
        self.tree()?.at_path(&path)
    }

    fn shape_mut(&mut self, shape: usize) -> Option<&mut XmlElement> {
        let path = self.shape_paths().into_iter().nth(shape)?;
        self.tree_mut()?.at_path_mut(&path)
    }
}

fn collect_shapes(tree: &XmlElement, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    for (idx, node) in tree.children.iter().enumerate() {
        let XmlNode::Element(element) = node else {
            continue;
        };
        match element.local_name() {
            "sp" | "pic" | "graphicFrame" | "cxnSp" | "contentPart" | "AlternateContent" => {
                let mut path = prefix.clone();
                path.push(idx);
                out.push(path);
            }
            "grpSp" => {
                prefix.push(idx);
                collect_shapes(element, prefix, out);
                prefix.pop();
            }
            _ => {}
        }
    }
}

fn classify(shape: &XmlElement) -> ShapeKind {
    match shape.local_name() {
        "sp" if shape.child("txBody").is_some() => ShapeKind::PlainText,
        "graphicFrame" if shape.find("tbl").is_some() => ShapeKind::Table,
        _ => ShapeKind::Other,
    }
}

fn table_rows(table: &XmlElement) -> Vec<&XmlElement> {
    table.children_named("tr").collect()
}

fn table_cell(shape: &XmlElement, row: usize, col: usize) -> Option<&XmlElement> {
    let table = shape.find("tbl")?;
    table.children_named("tr").nth(row)?.children_named("tc").nth(col)
}

fn table_cell_mut(shape: &mut XmlElement, row: usize, col: usize) -> Option<&mut XmlElement> {
    let table = shape.find_mut("tbl")?;
    let tr = table.elements_mut().filter(|e| e.local_name() == "tr").nth(row)?;
    tr.elements_mut().filter(|e| e.local_name() == "tc").nth(col)
}

/// The `r:id`-style attribute of an element, whatever prefix is bound.
fn relationship_id(element: &XmlElement) -> Option<&str> {
    element
        .attributes
        .iter()
        .find(|(key, _)| !key.starts_with("xmlns") && key.ends_with(":id"))
        .map(|(_, value)| value.as_str())
}

/// A slide layout declared by the first slide master.
#[derive(Debug, Clone)]
struct LayoutPart {
    path: String,
    name: String,
    xml: XmlDocument,
}

impl LayoutPart {
    /// Layout placeholders to copy onto a new slide.
    fn placeholder_shapes(&self) -> Vec<XmlElement> {
        let Some(tree) = self.xml.root.descend(&["cSld", "spTree"]) else {
            return Vec::new();
        };
        tree.children_named("sp")
            .filter(|sp| match sp.descend(&["nvSpPr", "nvPr", "ph"]) {
                Some(ph) => !SKIPPED_PLACEHOLDERS.contains(&ph.attr("type").unwrap_or("body")),
                None => false,
            })
            .cloned()
            .collect()
    }
}

/// A presentation loaded fully into memory for editing.
#[derive(Debug, Clone)]
pub struct PptxDocument {
    package: Package,
    content_types: ContentTypes,
    presentation_path: String,
    presentation: XmlDocument,
    presentation_rels: Relationships,
    slides: Vec<SlidePart>,
    layouts: Vec<LayoutPart>,
    converted_template: bool,
}

impl PptxDocument {
    /// Open a `.pptx` or `.potx` file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        log::debug!("Opening presentation {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a presentation from any seekable reader.
    ///
    /// Templates are coerced into presentations in memory; the source is
    /// never written to.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut package = Package::from_reader(reader)
            .map_err(|e| Error::Template(format!("not a presentation package ({})", e)))?;
        let converted_template = package.coerce_template()?;
        if converted_template {
            log::debug!("Template content type rewritten to presentation");
        }
        Self::from_package(package, converted_template)
    }

    /// Load a presentation held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    fn from_package(package: Package, converted_template: bool) -> Result<Self> {
        let content_types = ContentTypes::from_package(&package)?;

        let root_rels = read_rels(&package, "")?;
        let presentation_path = root_rels
            .first_of_type(rels::OFFICE_DOCUMENT)
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| "ppt/presentation.xml".to_string());
        if !package.contains(&presentation_path) {
            return Err(Error::Template(format!(
                "main presentation part '{}' is missing",
                presentation_path
            )));
        }
        let presentation = package.xml_part(&presentation_path)?;
        let presentation_rels = read_rels(&package, &presentation_path)?;

        let mut slides = Vec::new();
        if let Some(list) = presentation.root.child("sldIdLst") {
            for sld_id in list.children_named("sldId") {
                let rel = relationship_id(sld_id)
                    .and_then(|id| presentation_rels.get(id))
                    .ok_or_else(|| Error::Template("slide id without relationship".to_string()))?;
                let path = resolve_target(&presentation_path, &rel.target);
                slides.push(SlidePart {
                    xml: package.xml_part(&path)?,
                    rels: read_rels(&package, &path)?,
                    path,
                });
            }
        }

        let layouts = read_layouts(&package, &presentation_path, &presentation, &presentation_rels)?;

        log::debug!(
            "Presentation has {} slide(s) and {} layout(s)",
            slides.len(),
            layouts.len()
        );

        Ok(Self {
            package,
            content_types,
            presentation_path,
            presentation,
            presentation_rels,
            slides,
            layouts,
            converted_template,
        })
    }

    /// Whether the source was a template that had to be coerced.
    pub fn was_template(&self) -> bool {
        self.converted_template
    }

    /// Part names of the slides, in presentation order.
    pub fn slide_parts(&self) -> Vec<&str> {
        self.slides.iter().map(|s| s.path.as_str()).collect()
    }

    /// Text of every slide, for inspection.
    pub fn extract_text(&self) -> Vec<SlideText> {
        (0..self.slide_count())
            .map(|slide| {
                let mut text = SlideText::new(slide + 1);
                for shape in 0..self.shape_count(slide) {
                    match self.shape_kind(slide, shape) {
                        ShapeKind::PlainText => {
                            if let Some(t) = self.shape_text(slide, shape) {
                                text.add_block(t);
                            }
                        }
                        ShapeKind::Table => {
                            let (rows, cols) = self.table_size(slide, shape).unwrap_or((0, 0));
                            for row in 0..rows {
                                for col in 0..cols {
                                    if let Some(t) = self.cell_text(slide, shape, row, col) {
                                        text.add_block(t);
                                    }
                                }
                            }
                        }
                        ShapeKind::Other => {}
                    }
                }
                text
            })
            .collect()
    }

    /// Distinct `{field}` tokens of each slide, in slide order.
    pub fn placeholders(&self) -> Vec<Vec<String>> {
        self.extract_text()
            .into_iter()
            .map(|slide| slide.placeholders)
            .collect()
    }

    /// Write the presentation as a ZIP archive.
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<()> {
        self.to_package()?.write(writer)
    }

    /// Save the presentation to `path`; the file appears only once complete.
    pub fn save(&self, path: &Path) -> Result<()> {
        log::debug!("Saving {} slide(s) to {}", self.slides.len(), path.display());
        self.to_package()?.save(path)
    }

    fn to_package(&self) -> Result<Package> {
        let mut package = self.package.clone();
        package.set_part(crate::package::CONTENT_TYPES_PART, self.content_types.to_bytes()?);
        package.set_part(&self.presentation_path, self.presentation.to_bytes()?);
        package.set_part(
            &rels_path_for(&self.presentation_path),
            self.presentation_rels.to_bytes()?,
        );
        for slide in &self.slides {
            package.set_part(&slide.path, slide.xml.to_bytes()?);
            let rels_path = rels_path_for(&slide.path);
            if !slide.rels.is_empty() || package.contains(&rels_path) {
                package.set_part(&rels_path, slide.rels.to_bytes()?);
            }
        }
        Ok(package)
    }

    fn next_slide_part(&self) -> String {
        let highest = self
            .package
            .part_names()
            .chain(self.slides.iter().map(|s| s.path.as_str()))
            .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
            .filter_map(extract_slide_number)
            .max()
            .unwrap_or(0);
        format!("ppt/slides/slide{}.xml", highest + 1)
    }

    /// Hook a new slide part into the presentation at `position`.
    fn register_slide(&mut self, position: usize, part: SlidePart) -> Result<()> {
        let target = relative_target(&self.presentation_path, &part.path);
        let rid = self.presentation_rels.add(rels::SLIDE, &target);
        insert_slide_id(&mut self.presentation.root, position, &rid)?;
        self.content_types.set_override(&part.path, SLIDE_CONTENT_TYPE);
        log::debug!("Added {} at position {}", part.path, position + 1);
        self.slides.insert(position, part);
        Ok(())
    }
}

impl SlideDocument for PptxDocument {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn shape_count(&self, slide: usize) -> usize {
        self.slides.get(slide).map_or(0, |s| s.shape_paths().len())
    }

    fn shape_kind(&self, slide: usize, shape: usize) -> ShapeKind {
        self.slides
            .get(slide)
            .and_then(|s| s.shape(shape))
            .map_or(ShapeKind::Other, classify)
    }

    fn shape_text(&self, slide: usize, shape: usize) -> Option<String> {
        let shape = self.slides.get(slide)?.shape(shape)?;
        if classify(shape) != ShapeKind::PlainText {
            return None;
        }
        shape.child("txBody").map(read_text)
    }

    fn set_shape_text(&mut self, slide: usize, shape: usize, text: &str) -> Result<()> {
        let body = self
            .slides
            .get_mut(slide)
            .and_then(|s| s.shape_mut(shape))
            .filter(|s| s.local_name() == "sp")
            .and_then(|s| s.child_mut("txBody"))
            .ok_or_else(|| Error::Write(format!("slide {} shape {} has no text frame", slide + 1, shape)))?;
        write_text(body, text)
    }

    fn reset_text_frame(&mut self, slide: usize, shape: usize, text: &str) -> Result<()> {
        let sp = self
            .slides
            .get_mut(slide)
            .and_then(|s| s.shape_mut(shape))
            .filter(|s| s.local_name() == "sp")
            .ok_or_else(|| Error::Template(format!("slide {} shape {} cannot hold text", slide + 1, shape)))?;
        if sp.child("txBody").is_none() {
            let name = qualified(sp.prefix(), "txBody");
            sp.children.push(XmlNode::Element(XmlElement::new(name)));
        }
        if let Some(body) = sp.child_mut("txBody") {
            reset_text(body, text);
        }
        Ok(())
    }

    fn table_size(&self, slide: usize, shape: usize) -> Option<(usize, usize)> {
        let table = self.slides.get(slide)?.shape(shape)?.find("tbl")?;
        let rows = table_rows(table);
        let grid_cols = table
            .child("tblGrid")
            .map_or(0, |grid| grid.children_named("gridCol").count());
        let cols = if grid_cols > 0 {
            grid_cols
        } else {
            rows.iter()
                .map(|tr| tr.children_named("tc").count())
                .max()
                .unwrap_or(0)
        };
        Some((rows.len(), cols))
    }

    fn cell_text(&self, slide: usize, shape: usize, row: usize, col: usize) -> Option<String> {
        let cell = table_cell(self.slides.get(slide)?.shape(shape)?, row, col)?;
        Some(cell.child("txBody").map(read_text).unwrap_or_default())
    }

    fn set_cell_text(
        &mut self,
        slide: usize,
        shape: usize,
        row: usize,
        col: usize,
        text: &str,
    ) -> Result<()> {
        let cell = self
            .slides
            .get_mut(slide)
            .and_then(|s| s.shape_mut(shape))
            .and_then(|s| table_cell_mut(s, row, col))
            .ok_or_else(|| {
                Error::Template(format!(
                    "slide {} shape {} has no cell ({}, {})",
                    slide + 1,
                    shape,
                    row,
                    col
                ))
            })?;

        if cell.child("txBody").is_none() {
            let body = new_cell_body(cell.prefix(), text);
            cell.children.insert(0, XmlNode::Element(body));
            return Ok(());
        }
        if let Some(body) = cell.child_mut("txBody") {
            if let Err(Error::Write(reason)) = write_text(body, text) {
                log::debug!("Cell ({}, {}) rewritten without formatting: {}", row, col, reason);
                reset_text(body, text);
            }
        }
        Ok(())
    }

    fn layout_names(&self) -> Vec<String> {
        self.layouts.iter().map(|l| l.name.clone()).collect()
    }

    fn add_slide_from_layout(&mut self, layout: usize) -> Result<usize> {
        let layout = self
            .layouts
            .get(layout)
            .ok_or_else(|| Error::Template(format!("layout {} does not exist", layout)))?;
        let layout_path = layout.path.clone();
        let shapes = layout.placeholder_shapes();

        let path = self.next_slide_part();
        let mut xml = XmlDocument::parse(BLANK_SLIDE)?;
        let tree = xml
            .root
            .descend_mut(&["cSld", "spTree"])
            .ok_or_else(|| Error::XmlError("blank slide has no shape tree".to_string()))?;

        for (offset, mut sp) in shapes.into_iter().enumerate() {
            if let Some(props) = sp.descend_mut(&["nvSpPr", "cNvPr"]) {
                props.set_attr("id", (offset + 2).to_string());
            }
            // Prompt text ("Click to add title") is not content; keep only authored tokens.
            if let Some(body) = sp.child_mut("txBody") {
                if placeholders_in(&read_text(body)).is_empty() {
                    reset_text(body, "");
                }
            }
            tree.children.push(XmlNode::Element(sp));
        }

        let mut slide_rels = Relationships::default();
        slide_rels.add(rels::SLIDE_LAYOUT, &relative_target(&path, &layout_path));

        let position = self.slides.len();
        self.register_slide(
            position,
            SlidePart {
                path,
                xml,
                rels: slide_rels,
            },
        )?;
        Ok(position)
    }

    fn duplicate_slide(&mut self, source: usize, position: usize) -> Result<()> {
        let source_part = self
            .slides
            .get(source)
            .ok_or_else(|| Error::Template(format!("slide {} does not exist", source + 1)))?;

        let path = self.next_slide_part();
        let mut slide_rels = Relationships::default();
        // Notes and comments belong to the original slide only.
        for rel in source_part
            .rels
            .without_types(&[rels::NOTES_SLIDE, rels::COMMENTS])
            .iter()
        {
            let target = if rel.is_internal() {
                relative_target(&path, &resolve_target(&source_part.path, &rel.target))
            } else {
                rel.target.clone()
            };
            slide_rels.push_copy(rel, target);
        }

        let part = SlidePart {
            path,
            xml: source_part.xml.clone(),
            rels: slide_rels,
        };
        let position = position.min(self.slides.len());
        self.register_slide(position, part)
    }
}

fn read_rels(package: &Package, part: &str) -> Result<Relationships> {
    let path = rels_path_for(part);
    if !package.contains(&path) {
        return Ok(Relationships::default());
    }
    Relationships::parse(package.part_str(&path)?)
}

/// Layouts of the first slide master, in `p:sldLayoutIdLst` order.
fn read_layouts(
    package: &Package,
    presentation_path: &str,
    presentation: &XmlDocument,
    presentation_rels: &Relationships,
) -> Result<Vec<LayoutPart>> {
    let master_rel = presentation
        .root
        .descend(&["sldMasterIdLst", "sldMasterId"])
        .and_then(relationship_id)
        .and_then(|id| presentation_rels.get(id))
        .or_else(|| presentation_rels.first_of_type(rels::SLIDE_MASTER));
    let Some(master_rel) = master_rel else {
        log::warn!("Presentation declares no slide master");
        return Ok(Vec::new());
    };

    let master_path = resolve_target(presentation_path, &master_rel.target);
    let master = package.xml_part(&master_path)?;
    let master_rels = read_rels(package, &master_path)?;

    let layout_targets: Vec<String> = match master.root.child("sldLayoutIdLst") {
        Some(list) => list
            .children_named("sldLayoutId")
            .filter_map(relationship_id)
            .filter_map(|id| master_rels.get(id))
            .map(|r| r.target.clone())
            .collect(),
        None => master_rels
            .iter()
            .filter(|r| r.rel_type == rels::SLIDE_LAYOUT)
            .map(|r| r.target.clone())
            .collect(),
    };

    layout_targets
        .iter()
        .map(|target| -> Result<LayoutPart> {
            let path = resolve_target(&master_path, target);
            let xml = package.xml_part(&path)?;
            let name = xml
                .root
                .child("cSld")
                .and_then(|c| c.attr("name"))
                .unwrap_or_default()
                .to_string();
            Ok(LayoutPart { path, name, xml })
        })
        .collect()
}

/// Prefix bound to the relationships namespace on `root`, declaring `r` if needed.
fn relationship_prefix(root: &mut XmlElement) -> String {
    if let Some((key, _)) = root
        .attributes
        .iter()
        .find(|(key, value)| key.starts_with("xmlns:") && value == RELATIONSHIPS_NS)
    {
        return key["xmlns:".len()..].to_string();
    }
    root.set_attr("xmlns:r", RELATIONSHIPS_NS);
    "r".to_string()
}

/// Insert a `p:sldId` for `rid` so that it becomes the `position`-th slide.
fn insert_slide_id(root: &mut XmlElement, position: usize, rid: &str) -> Result<()> {
    let prefix = root.prefix().map(str::to_string);
    let r_prefix = relationship_prefix(root);

    if root.child("sldIdLst").is_none() {
        // sldIdLst follows the master id lists.
        let insert_at = root
            .children
            .iter()
            .rposition(|node| {
                matches!(node, XmlNode::Element(e) if matches!(
                    e.local_name(),
                    "sldMasterIdLst" | "notesMasterIdLst" | "handoutMasterIdLst"
                ))
            })
            .map_or(0, |idx| idx + 1);
        root.children.insert(
            insert_at,
            XmlNode::Element(XmlElement::new(qualified(prefix.as_deref(), "sldIdLst"))),
        );
    }

    let list = root
        .child_mut("sldIdLst")
        .ok_or_else(|| Error::XmlError("missing sldIdLst".to_string()))?;

    let next_id = list
        .children_named("sldId")
        .filter_map(|e| e.attr("id")?.parse::<u32>().ok())
        .max()
        .map_or(256, |max| max + 1)
        .max(256);
    let element = XmlElement::new(qualified(prefix.as_deref(), "sldId"))
        .with_attr("id", next_id.to_string())
        .with_attr(format!("{}:id", r_prefix), rid);

    let slide_indices: Vec<usize> = list
        .children
        .iter()
        .enumerate()
        .filter(|(_, node)| matches!(node, XmlNode::Element(e) if e.local_name() == "sldId"))
        .map(|(idx, _)| idx)
        .collect();
    let insert_at = match slide_indices.get(position) {
        Some(idx) => *idx,
        None => slide_indices.last().map_or(0, |idx| idx + 1),
    };
    list.children.insert(insert_at, XmlNode::Element(element));
    Ok(())
}
