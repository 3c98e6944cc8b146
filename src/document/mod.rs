/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod builder;
mod error;
mod parser;

use std::fmt::Display;
use std::str::FromStr;

use super::entities::escape_fmt;
use super::entities::escaped_size;
pub use builder::ElementBuilder;
pub use error::DocumentError;
pub use parser::DocumentParser;

/// A child of an [Element].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Element(_) => None,
            Node::Text(text) => Some(text),
        }
    }
}

/// An owned XML element.
///
/// Elements are what flows over an XMPP stream: every stanza and every
/// negotiation step is a single element with its subtree. Attribute order
/// is preserved, and adjacent text is merged into a single node.
///
/// ```
/// use iksjab::Element;
///
/// let message = Element::new("message")
///     .with_attribute("to", "juliet@example.com")
///     .with_child(Element::new("body").with_text("Wherefore art thou?"));
/// assert_eq!(
///     message.to_string(),
///     "<message to=\"juliet@example.com\"><body>Wherefore art thou?</body></message>"
/// );
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Element {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates an element with the given default namespace.
    pub fn with_namespace(name: impl Into<String>, namespace: &str) -> Element {
        Element::new(name).with_attribute("xmlns", namespace)
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Element {
        self.set_attribute(name, Some(value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Element {
        self.push_child(child);
        self
    }

    pub fn with_text(mut self, text: &str) -> Element {
        self.push_text(text);
        self
    }

    /// Full tag name including any namespace prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag name without the namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Namespace declared on this element for its own name.
    ///
    /// Inherited namespaces are not resolved; XMPP payloads declare their
    /// namespace on the payload element itself.
    pub fn namespace(&self) -> Option<&str> {
        match self.name.split_once(':') {
            Some((prefix, _)) => self.attributes.iter().find_map(|(name, value)| {
                match name.strip_prefix("xmlns:") {
                    Some(declared) if declared == prefix => Some(value.as_str()),
                    _ => None,
                }
            }),
            None => self.attribute("xmlns"),
        }
    }

    pub fn is(&self, local_name: &str, namespace: &str) -> bool {
        self.local_name() == local_name && self.namespace() == Some(namespace)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Sets or removes an attribute.
    ///
    /// An existing attribute keeps its position when its value is replaced.
    pub fn set_attribute(&mut self, name: &str, value: Option<String>) {
        let pos = self.attributes.iter().position(|(attr, _)| attr == name);
        match (pos, value) {
            (Some(pos), Some(value)) => self.attributes[pos].1 = value,
            (Some(pos), None) => {
                self.attributes.remove(pos);
            }
            (None, Some(value)) => self.attributes.push((name.to_string(), value)),
            (None, None) => (),
        }
    }

    /// Adds a new attribute, failing if it is already present.
    pub fn insert_attribute(&mut self, name: &str, value: &str) -> Result<(), DocumentError> {
        if self.attribute(name).is_some() {
            return Err(DocumentError::BadXml(error::description::DUPLICATE_ATTRIBUTE));
        }
        self.attributes.push((name.to_string(), value.to_string()));
        Ok(())
    }

    pub fn children(&self) -> std::slice::Iter<'_, Node> {
        self.children.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    /// Removes all children and returns them.
    pub fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    /// Child elements, skipping the text nodes.
    pub fn tags(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn first_tag(&self) -> Option<&Element> {
        self.tags().next()
    }

    pub fn find_tag(&self, name: &str) -> Option<&Element> {
        self.tags().find(|tag| tag.name == name)
    }

    pub fn find_tag_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|child| match child {
            Node::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    pub fn find_tag_ns(&self, local_name: &str, namespace: &str) -> Option<&Element> {
        self.tags().find(|tag| tag.is(local_name, namespace))
    }

    /// Text of the direct children, concatenated.
    pub fn text(&self) -> String {
        self.children.iter().filter_map(Node::as_text).collect()
    }

    /// Text of the named child, if that child exists.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.find_tag(name).map(Element::text)
    }

    /// Exact length of the serialized element.
    pub fn str_size(&self) -> usize {
        let mut size = 1 + self.name.len(); // '<' and name
        for (name, value) in &self.attributes {
            size += 1 + name.len() + 2 + escaped_size(value) + 1; // ' name="value"'
        }
        if self.children.is_empty() {
            return size + 2; // '/>'
        }
        size += 1;
        for child in &self.children {
            size += match child {
                Node::Element(element) => element.str_size(),
                Node::Text(text) => escaped_size(text),
            };
        }
        size + 2 + self.name.len() + 1
    }

    /// Serializes only the start tag, leaving the element open.
    ///
    /// This is used for the stream header which is never closed until
    /// the end of the session.
    pub fn to_start_tag(&self) -> String {
        let mut buf = String::with_capacity(self.str_size());
        let _ = self.write_start(&mut buf);
        buf.push('>');
        buf
    }

    fn write_start(&self, f: &mut impl std::fmt::Write) -> std::fmt::Result {
        f.write_char('<')?;
        f.write_str(&self.name)?;
        for (name, value) in &self.attributes {
            f.write_char(' ')?;
            f.write_str(name)?;
            f.write_str("=\"")?;
            escape_fmt(value, f)?;
            f.write_char('"')?;
        }
        Ok(())
    }

    fn write_to(&self, f: &mut impl std::fmt::Write) -> std::fmt::Result {
        self.write_start(f)?;
        if self.children.is_empty() {
            return f.write_str("/>");
        }
        f.write_char('>')?;
        for child in &self.children {
            match child {
                Node::Element(element) => element.write_to(f)?,
                Node::Text(text) => escape_fmt(text, f)?,
            }
        }
        f.write_str("</")?;
        f.write_str(&self.name)?;
        f.write_char('>')
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_to(f)
    }
}

impl FromStr for Element {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = DocumentParser::new();
        parser.parse_bytes(s.as_bytes())?;
        parser.into_element()
    }
}
