//! Parsed document tree.
//!
//! Documents are small, flat-ish XML files, so the whole file is read into an
//! owned element tree. Element names are stored as local names (namespace
//! prefixes dropped); attributes are not used by any document kind.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{IngestError, IngestResult};

/// One element: local name, concatenated text content, child elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first direct child with the given name.
    ///
    /// `None` when the element is absent; `Some("")` when present but empty.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }
}

/// A parsed inbound document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    root: XmlElement,
}

impl ParsedDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    pub fn root_tag(&self) -> &str {
        &self.root.name
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Parse raw file bytes. Content must be UTF-8 (an optional BOM is skipped).
    pub fn from_bytes(bytes: &[u8]) -> IngestResult<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| IngestError::malformed(format!("content is not valid UTF-8: {e}")))?;
        Self::parse(text)
    }

    /// Parse a document from text.
    pub fn parse(xml: &str) -> IngestResult<Self> {
        let xml = xml.trim_start_matches('\u{feff}');
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if root.is_some() {
                        return Err(IngestError::malformed("multiple root elements"));
                    }
                    stack.push(XmlElement::new(element_name(e.local_name().as_ref())?));
                }
                Ok(Event::Empty(e)) => {
                    let element = XmlElement::new(element_name(e.local_name().as_ref())?);
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| IngestError::malformed("unexpected closing tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| IngestError::malformed(format!("bad text content: {e}")))?;
                    push_text(&mut stack, &text)?;
                }
                Ok(Event::CData(c)) => {
                    let raw = c.into_inner();
                    let text = std::str::from_utf8(&raw)
                        .map_err(|e| IngestError::malformed(format!("bad CDATA content: {e}")))?;
                    push_text(&mut stack, text)?;
                }
                Ok(Event::Eof) => break,
                // Declarations, comments, processing instructions, doctype.
                Ok(_) => {}
                Err(e) => {
                    return Err(IngestError::malformed(format!(
                        "xml error at position {}: {e}",
                        reader.buffer_position()
                    )));
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(IngestError::malformed(format!(
                "element `{}` is not closed",
                open.name
            )));
        }

        root.map(Self::new)
            .ok_or_else(|| IngestError::malformed("document has no root element"))
    }
}

fn element_name(raw: &[u8]) -> IngestResult<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| IngestError::malformed(format!("element name is not UTF-8: {e}")))
}

fn attach(
    stack: &mut Vec<XmlElement>,
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> IngestResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(IngestError::malformed("multiple root elements")),
    }
}

fn push_text(stack: &mut [XmlElement], text: &str) -> IngestResult<()> {
    match stack.last_mut() {
        Some(top) => {
            top.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(IngestError::malformed("text outside of the root element")),
    }
}
