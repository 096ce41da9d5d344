//! Minimal element tree and its UTF-8 serialization.
//!
//! Dialects build [`XmlElement`] values; [`to_document`] writes them with a
//! `version="1.0" encoding="UTF-8"` declaration and two-space indentation.
//! Output depends only on the tree, so equal trees serialize to identical
//! bytes.

use crate::{Error, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// Nested element.
    Element(XmlElement),
    /// `<!-- ... -->` comment.
    Comment(String),
}

/// An XML element with attributes, optional text, and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Empty element named `name` (may carry a namespace prefix).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Add an attribute; declaration order is preserved.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Set the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child element.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.push_child(child);
        self
    }

    /// Append a child element in place.
    pub fn push_child(&mut self, child: Self) {
        self.children.push(XmlNode::Element(child));
    }

    /// Append a comment in place.
    pub fn push_comment(&mut self, comment: impl Into<String>) {
        self.children.push(XmlNode::Comment(comment.into()));
    }

    /// Element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the attribute `name`, if set.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text content, if set.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// All children, comments included.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Child elements only.
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Comment(_) => None,
        })
    }

    /// First child element named `name`.
    pub fn find(&self, name: &str) -> Option<&Self> {
        self.elements().find(|el| el.name == name)
    }
}

/// Serialize `root` as a complete UTF-8 document.
pub fn to_document(root: &XmlElement) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Error::Serialization(e.to_string()))?;
    write_element(&mut writer, root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.text.is_none() && element.children.is_empty() {
        return write(writer, Event::Empty(start));
    }

    write(writer, Event::Start(start))?;
    if let Some(text) = &element.text {
        write(writer, Event::Text(BytesText::new(text)))?;
    }
    for child in &element.children {
        match child {
            XmlNode::Element(el) => write_element(writer, el)?,
            XmlNode::Comment(comment) => {
                let comment = format!(" {} ", comment_safe(comment));
                write(writer, Event::Comment(BytesText::new(&comment)))?;
            },
        }
    }
    write(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

/// Break up every `--` run, which is not allowed inside a comment.
fn comment_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_dash = false;
    for c in text.chars() {
        if c == '-' && after_dash {
            out.push(' ');
        }
        after_dash = c == '-';
        out.push(c);
    }
    out
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Serialization(e.to_string()))
}
