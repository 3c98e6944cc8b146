/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use crate::Location;
use crate::SaxElement;
use crate::SaxError;
use crate::SaxHandler;
use crate::SaxParser;

use super::Element;
use super::ElementBuilder;
use super::error::DocumentError;
use super::error::description;

struct DocumentHandler {
    builder: ElementBuilder,
    root: Option<Element>,
}

impl SaxHandler for DocumentHandler {
    fn handle_element(&mut self, element: &SaxElement) -> Result<(), SaxError> {
        if let Some(root) = self.builder.append_element(element)? {
            self.root = Some(root);
        }
        Ok(())
    }
}

/// Parses a standalone XML document into an [Element].
pub struct DocumentParser {
    handler: DocumentHandler,
    parser: SaxParser,
}

impl DocumentParser {
    pub fn new() -> DocumentParser {
        DocumentParser {
            handler: DocumentHandler {
                builder: ElementBuilder::new(),
                root: None,
            },
            parser: SaxParser::new(),
        }
    }

    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Result<(), DocumentError> {
        Ok(self.parser.parse_bytes(&mut self.handler, bytes)?)
    }

    pub fn into_element(mut self) -> Result<Element, DocumentError> {
        self.parser.parse_finish()?;
        self.handler
            .root
            .take()
            .ok_or(DocumentError::BadXml(description::NO_DOCUMENT))
    }

    pub fn location(&self) -> Location {
        self.parser.location()
    }
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new()
    }
}
