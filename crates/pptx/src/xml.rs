//! A small mutable XML element tree on top of quick-xml events.
//!
//! Names are kept exactly as written (`p:sp`, `a:t`), so a parsed part
//! serializes back with its original prefixes and namespace declarations.

use pptgen_core::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::io::Cursor;

/// A parsed XML part.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// The `<?xml ...?>` declaration, if the source had one.
    pub decl: Option<BytesDecl<'static>>,
    /// The document element.
    pub root: XmlElement,
}

/// An element with its attributes and mixed content.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified name, prefix included.
    pub name: String,
    /// Attributes in source order, values unescaped.
    pub attributes: Vec<(String, String)>,
    /// Child nodes in source order.
    pub children: Vec<XmlNode>,
}

/// One child node of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    /// Comments and processing instructions, written back untouched.
    Raw(Event<'static>),
}

impl XmlDocument {
    /// Parse an XML part.
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        reader.trim_text(false);

        let mut decl = None;
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Decl(d)) => decl = Some(d.into_owned()),
                Ok(Event::Start(ref e)) => stack.push(element_from_start(e, &reader)?),
                Ok(Event::Empty(ref e)) => {
                    let element = element_from_start(e, &reader)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("Unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::XmlError(format!("Bad text content: {}", e)))?;
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Ok(event @ (Event::Comment(_) | Event::PI(_))) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Raw(event.into_owned()));
                    }
                }
                Ok(Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
            }
        }

        if !stack.is_empty() {
            return Err(Error::XmlError("Unclosed element at end of input".to_string()));
        }
        let root = root.ok_or_else(|| Error::XmlError("Document has no root element".to_string()))?;
        Ok(Self { decl, root })
    }

    /// Serialize the document back to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        if let Some(decl) = &self.decl {
            writer
                .write_event(Event::Decl(decl.clone()))
                .map_err(|e| Error::XmlError(format!("Failed to write declaration: {}", e)))?;
        }
        write_element(&mut writer, &self.root)?;
        Ok(writer.into_inner().into_inner())
    }
}

impl XmlElement {
    /// Create an element without attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute, builder style.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Add a child element, builder style.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Add a text child, builder style.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Namespace prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Value of the attribute with this exact qualified name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Child elements, mutably.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with this local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.local_name() == local)
    }

    /// First child element with this local name, mutably.
    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.local_name() == local)
    }

    /// Child elements with this local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |e| e.local_name() == local)
    }

    /// Follow a chain of child local names.
    pub fn descend(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |element, local| element.child(local))
    }

    /// Follow a chain of child local names, mutably.
    pub fn descend_mut(&mut self, path: &[&str]) -> Option<&mut XmlElement> {
        let mut element = self;
        for local in path {
            element = element.child_mut(local)?;
        }
        Some(element)
    }

    /// First element with this local name in depth-first order, self included.
    pub fn find(&self, local: &str) -> Option<&XmlElement> {
        if self.local_name() == local {
            return Some(self);
        }
        self.elements().find_map(|e| e.find(local))
    }

    /// Mutable variant of [`XmlElement::find`].
    pub fn find_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        if self.local_name() == local {
            return Some(self);
        }
        self.elements_mut().find_map(|e| e.find_mut(local))
    }

    /// Concatenated text of all text children (not descendants).
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Remove every child element with this local name.
    pub fn remove_children(&mut self, local: &str) {
        self.children.retain(|node| match node {
            XmlNode::Element(e) => e.local_name() != local,
            _ => true,
        });
    }

    /// The element reached by walking child-node indices.
    pub fn at_path(&self, path: &[usize]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |element, idx| match element.children.get(*idx)? {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Mutable variant of [`XmlElement::at_path`].
    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut element = self;
        for idx in path {
            element = match element.children.get_mut(*idx)? {
                XmlNode::Element(e) => e,
                _ => return None,
            };
        }
        Some(element)
    }
}

/// Qualified name for a new element sharing `sibling`'s namespace prefix.
pub fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

fn element_from_start(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::XmlError(format!("Bad attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(reader)
            .map_err(|e| Error::XmlError(format!("Bad attribute value: {}", e)))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::XmlError("Multiple root elements".to_string())),
    }
    Ok(())
}

/// Escapes an attribute value, keeping whitespace characters as character
/// references so attribute-value normalization cannot fold them to spaces.
fn escape_attribute(value: &str) -> String {
    let escaped = escape(value);
    if !escaped.contains(['\n', '\r', '\t']) {
        return escaped.into_owned();
    }
    let mut out = String::with_capacity(escaped.len() + 8);
    for c in escaped.chars() {
        match c {
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            '\t' => out.push_str("&#x9;"),
            c => out.push(c),
        }
    }
    out
}

fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Owned(escape_attribute(value).into_bytes()),
        });
    }

    let write_err = |e: quick_xml::Error| Error::XmlError(format!("Failed to write <{}>: {}", element.name, e));

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_err);
    }

    writer.write_event(Event::Start(start)).map_err(write_err)?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(write_err)?,
            XmlNode::Raw(event) => writer.write_event(event.clone()).map_err(write_err)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_err)
}
