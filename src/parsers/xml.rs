//! A small element tree built on top of `quick-xml`.
//!
//! Coverage formats are walked as a tree rather than as an event stream so
//! that a report is either fully validated or rejected. Elements that may
//! occur once or many times are always reached through
//! [`Element::children`], which yields zero, one or many matches uniformly.
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{CoverageError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    /// Value of an attribute, if present.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every direct child with the given name, in document order.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn xml_err(e: quick_xml::Error, reader: &Reader<&[u8]>) -> CoverageError {
    CoverageError::Xml {
        source: e,
        position: reader.buffer_position(),
    }
}

fn element_from(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_err(e.into(), reader))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| xml_err(e, reader))?;
        attributes.push((key, value.into_owned()));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

/// Attach a completed element to its parent, or make it the document root.
fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_some() {
        return Err(CoverageError::Parse(format!(
            "unexpected second root element <{}>",
            element.name
        )));
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn text_outside_root(reader: &Reader<&[u8]>) -> CoverageError {
    CoverageError::Parse(format!(
        "text outside the root element at position {}",
        reader.buffer_position()
    ))
}

/// Parse a complete document into its root element.
pub fn parse_document(text: &str) -> Result<Element> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Err(e) => return Err(xml_err(e, &reader)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) => {
                let element = element_from(e, &reader)?;
                stack.push(element);
            }
            Ok(Event::Empty(ref e)) => {
                let element = element_from(e, &reader)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(ref e)) => {
                let element = stack.pop().ok_or_else(|| {
                    CoverageError::Parse(format!(
                        "unmatched closing tag </{}> at position {}",
                        String::from_utf8_lossy(e.name().as_ref()),
                        reader.buffer_position()
                    ))
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(ref e)) if stack.is_empty() => {
                if e.iter().any(|b| !b.is_ascii_whitespace()) {
                    return Err(text_outside_root(&reader));
                }
            }
            Ok(Event::CData(_)) if stack.is_empty() => {
                return Err(text_outside_root(&reader));
            }
            // Declarations, comments, character data inside elements and
            // processing instructions carry nothing a coverage report needs.
            Ok(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(CoverageError::Parse(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| CoverageError::Parse("document has no root element".to_string()))
}
