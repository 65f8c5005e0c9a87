//! # SVG Document Tree
//!
//! A small mutable element tree for SVG documents, parsed from and
//! serialized to text via `quick-xml` events. The templating pipeline needs
//! read access, attribute/text mutation, and deep copies of subtrees;
//! nothing here is SVG-aware beyond tag names.
//!
//! Namespace handling is by local name: tags are compared with any
//! `prefix:` stripped, and the common Inkscape output (default namespace,
//! `xmlns` carried as a plain attribute) round-trips unchanged.

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};

use crate::error::EtiquetaError;

/// SVG text-layout elements the text extractor does not support.
const UNSUPPORTED_TEXT_TAGS: &[&str] = &[
    "altGlyph",
    "altGlyphDef",
    "altGlyphItem",
    "glyph",
    "glyphRef",
    "textPath",
    "tref",
];

/// A child of an [`Element`]: a nested element or a text node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// One element with ordered attributes and children.
///
/// `Clone` is the deep copy used to instantiate a template per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name as written, possibly namespace-prefixed.
    pub name: String,
    /// Attributes in document order.
    pub attrs: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Tag name with any namespace prefix stripped.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Child elements in order, skipping text nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(elt) => Some(elt),
            Node::Text(_) => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(elt) => Some(elt),
            Node::Text(_) => None,
        })
    }
}

/// Parse an SVG (or any XML) document into its root element.
pub fn parse(text: &str) -> Result<Element, EtiquetaError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| EtiquetaError::Template(format!("XML parse error: {e}")))?;
        match event {
            Event::Start(start) => {
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                let elt = element_from_start(&start)?;
                attach(&mut stack, &mut root, elt)?;
            }
            Event::End(_) => {
                let elt = stack
                    .pop()
                    .ok_or_else(|| EtiquetaError::Template("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, elt)?;
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| EtiquetaError::Template(format!("bad text content: {e}")))?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::CData(c) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(Node::Text(String::from_utf8_lossy(&c).into_owned()));
                }
            }
            Event::Eof => break,
            // Declarations, comments, PIs, doctypes: not part of the tree.
            _ => {}
        }
    }

    root.ok_or_else(|| EtiquetaError::Template("document has no root element".into()))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, EtiquetaError> {
    let mut elt = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| EtiquetaError::Template(format!("bad attribute: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| EtiquetaError::Template(format!("bad attribute value: {e}")))?;
        elt.attrs.insert(key, value.into_owned());
    }
    Ok(elt)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    elt: Element,
) -> Result<(), EtiquetaError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(elt));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(elt);
            Ok(())
        }
        None => Err(EtiquetaError::Template(
            "multiple root elements in document".into(),
        )),
    }
}

/// Serialize a subtree to XML text (no declaration).
pub fn serialize(elt: &Element) -> String {
    let mut buf = Vec::new();
    let mut writer = Writer::new(&mut buf);
    write_element(&mut writer, elt);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serialize a full document: XML declaration plus the root subtree.
pub fn serialize_document(root: &Element) -> String {
    let mut buf = Vec::new();
    let mut writer = Writer::new(&mut buf);
    let _ = writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)));
    let _ = writer.write_event(Event::Text(BytesText::from_escaped("\n")));
    write_element(&mut writer, root);
    let mut out = String::from_utf8_lossy(&buf).into_owned();
    out.push('\n');
    out
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, elt: &Element) {
    let mut start = BytesStart::new(&elt.name);
    for (key, value) in &elt.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if elt.children.is_empty() {
        let _ = writer.write_event(Event::Empty(start));
        return;
    }
    let _ = writer.write_event(Event::Start(start.borrow()));
    for child in &elt.children {
        match child {
            Node::Element(inner) => write_element(writer, inner),
            Node::Text(text) => {
                let _ = writer.write_event(Event::Text(BytesText::new(text)));
            }
        }
    }
    let _ = writer.write_event(Event::End(start.to_end()));
}

/// Collect all text from a `text` element and its `tspan` descendants,
/// ignoring formatting (line breaks between spans are dropped).
///
/// Non-text child elements are skipped; the SVG glyph/textPath family is
/// rejected because its content model is not a plain character stream.
pub fn text_contents(elt: &Element) -> Result<String, EtiquetaError> {
    let mut out = String::new();
    collect_text(elt, &mut out)?;
    Ok(out)
}

fn collect_text(elt: &Element, out: &mut String) -> Result<(), EtiquetaError> {
    let local = elt.local_name();
    if UNSUPPORTED_TEXT_TAGS.contains(&local) {
        return Err(EtiquetaError::Template(format!(
            "text extraction only supports tspan children, got '{local}'"
        )));
    }
    if local != "text" && local != "tspan" {
        // Discard non-text elements.
        return Ok(());
    }
    for child in &elt.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(inner) => collect_text(inner, out)?,
        }
    }
    Ok(())
}
