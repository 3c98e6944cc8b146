/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use crate::SaxElement;

use super::Element;
use super::error::DocumentError;
use super::error::description;

/// Assembles [SaxElement] events into owned element trees.
///
/// A completed element is returned when its outermost end tag arrives.
pub struct ElementBuilder {
    stack: Vec<Element>,
}

impl ElementBuilder {
    pub fn new() -> Self {
        ElementBuilder { stack: Vec::new() }
    }

    pub fn append_element(
        &mut self,
        element: &SaxElement,
    ) -> Result<Option<Element>, DocumentError> {
        match element {
            SaxElement::StartTag(name) => self.stack.push(Element::new(*name)),
            SaxElement::Attribute(name, value) => self.current()?.insert_attribute(name, value)?,
            SaxElement::StartTagContent => {}
            SaxElement::StartTagEmpty => return Ok(self.close()),
            SaxElement::CData(cdata) => self.current()?.push_text(cdata),
            SaxElement::EndTag(name) => {
                if self.current()?.name() != *name {
                    return Err(DocumentError::BadXml(description::TAG_MISMATCH));
                }
                return Ok(self.close());
            }
        }
        Ok(None)
    }

    /// Number of currently open tags.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn reset(&mut self) {
        self.stack.clear();
    }

    fn current(&mut self) -> Result<&mut Element, DocumentError> {
        self.stack
            .last_mut()
            .ok_or(DocumentError::BadXml(description::NO_START_TAG))
    }

    fn close(&mut self) -> Option<Element> {
        let element = self.stack.pop()?;
        match self.stack.last_mut() {
            Some(parent) => {
                parent.push_child(element);
                None
            }
            None => Some(element),
        }
    }
}

impl Default for ElementBuilder {
    fn default() -> Self {
        Self::new()
    }
}
