//! Document trees and their XML text form
//!
//! A [`TreeNode`] is a namespace-free element: name, attributes in document
//! order, child elements and optional text. [`parse_xml`] drops namespaces,
//! comments and whitespace-only text; [`to_xml`] puts the standard namespace
//! on the root element.

use crate::error::{DecodeError, EncodeError};
use indexmap::IndexMap;
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::Writer;
use roxmltree::Document;
use std::borrow::Cow;
use std::io::Cursor;

pub const STANDARD_NS: &str = "http://hl7.org/fhir";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<TreeNode>,
    pub text: Option<String>,
}

impl TreeNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A primitive element: `<name value="..."/>`
    pub fn primitive(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name).with_attribute("value", value)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn value(&self) -> Option<&str> {
        self.attribute("value")
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TreeNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty() && self.text.is_none()
    }
}

/// Render a tree as indented XML with the standard namespace on the root
pub fn to_xml(root: &TreeNode) -> Result<String, EncodeError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    let mut start = BytesStart::new(root.name.as_str());
    if !root.attributes.contains_key("xmlns") {
        start.push_attribute(("xmlns", STANDARD_NS));
    }
    write_node(&mut writer, root, start)?;

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

fn write_node(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    node: &TreeNode,
    mut start: BytesStart<'_>,
) -> Result<(), EncodeError> {
    for (name, value) in &node.attributes {
        start.push_attribute(attribute(name, value));
    }

    if node.children.is_empty() && node.text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &node.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &node.children {
        write_node(writer, child, BytesStart::new(child.name.as_str()))?;
    }
    writer.write_event(Event::End(BytesEnd::new(node.name.as_str())))?;
    Ok(())
}

/// An escaped attribute. Tab, newline and carriage return are written as
/// character references: parsers normalise them to spaces otherwise.
fn attribute<'a>(name: &'a str, value: &str) -> Attribute<'a> {
    let mut text = String::with_capacity(value.len());
    for c in escape(value).chars() {
        match c {
            '\t' => text.push_str("&#9;"),
            '\n' => text.push_str("&#10;"),
            '\r' => text.push_str("&#13;"),
            c => text.push(c),
        }
    }
    Attribute {
        key: QName(name.as_bytes()),
        value: Cow::Owned(text.into_bytes()),
    }
}

/// Parse XML text into a tree rooted at the document element
pub fn parse_xml(input: &str) -> Result<TreeNode, DecodeError> {
    let doc = Document::parse(input)?;
    Ok(build_node(doc.root_element()))
}

fn build_node(node: roxmltree::Node<'_, '_>) -> TreeNode {
    let mut tree = TreeNode::new(node.tag_name().name());
    for attribute in node.attributes() {
        tree.attributes
            .insert(attribute.name().to_string(), attribute.value().to_string());
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            tree.children.push(build_node(child));
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }
    if !text.trim().is_empty() {
        tree.text = Some(text);
    }
    tree
}
