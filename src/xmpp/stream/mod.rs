/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod error;

use std::collections::VecDeque;

use crate::Element;
use crate::ElementBuilder;
use crate::SaxElement;
use crate::SaxError;
use crate::SaxHandler;
use crate::SaxParser;

use super::constants::STREAM_TAG;
use error::description;
pub use error::StreamError;

/// A top level construct of an XMPP stream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StreamElement {
    /// The `<stream:stream>` header with its attributes and no children.
    Start(Element),
    /// A complete child of the stream: a stanza or a negotiation element.
    Element(Element),
    /// The peer closed the stream with `</stream:stream>`.
    End,
}

struct StreamBuilder {
    header: Option<Element>,
    started: bool,
    builder: ElementBuilder,
    queue: VecDeque<StreamElement>,
    error: Option<StreamError>,
}

impl StreamBuilder {
    fn new() -> Self {
        Self {
            header: None,
            started: false,
            builder: ElementBuilder::new(),
            queue: VecDeque::new(),
            error: None,
        }
    }

    fn reset(&mut self) {
        self.header = None;
        self.started = false;
        self.builder.reset();
        self.queue.clear();
        self.error = None;
    }

    fn abort(&mut self, err: StreamError) -> SaxError {
        self.error = Some(err);
        SaxError::HandlerAbort("stream builder")
    }

    fn handle_header(&mut self, element: &SaxElement) -> Result<(), SaxError> {
        match element {
            SaxElement::StartTag(name) => {
                if *name != STREAM_TAG {
                    return Err(self.abort(StreamError::BadStream(description::NOT_A_STREAM)));
                }
                self.header = Some(Element::new(*name));
            }
            SaxElement::Attribute(name, value) => {
                if let Some(header) = self.header.as_mut()
                    && let Err(err) = header.insert_attribute(name, value)
                {
                    return Err(self.abort(err.into()));
                }
            }
            SaxElement::StartTagContent => {
                self.started = true;
                if let Some(header) = self.header.take() {
                    self.queue.push_back(StreamElement::Start(header));
                }
            }
            SaxElement::StartTagEmpty => {
                return Err(self.abort(StreamError::BadStream(description::EMPTY_STREAM)));
            }
            SaxElement::CData(_) | SaxElement::EndTag(_) => {
                return Err(self.abort(StreamError::BadStream(description::NOT_A_STREAM)));
            }
        }
        Ok(())
    }
}

impl SaxHandler for StreamBuilder {
    fn handle_element(&mut self, element: &SaxElement) -> Result<(), SaxError> {
        if !self.started {
            return self.handle_header(element);
        }
        if self.builder.depth() == 0 {
            match element {
                SaxElement::CData(cdata) => {
                    // Whitespace keepalives between stanzas
                    if !cdata.trim().is_empty() {
                        return Err(
                            self.abort(StreamError::BadStream(description::TEXT_AT_STREAM_LEVEL))
                        );
                    }
                    return Ok(());
                }
                SaxElement::EndTag(name) => {
                    if *name != STREAM_TAG {
                        return Err(
                            self.abort(StreamError::BadStream(description::STREAM_END_MISMATCH))
                        );
                    }
                    self.started = false;
                    self.queue.push_back(StreamElement::End);
                    return Ok(());
                }
                _ => (),
            }
        }
        match self.builder.append_element(element) {
            Ok(Some(complete)) => self.queue.push_back(StreamElement::Element(complete)),
            Ok(None) => (),
            Err(err) => return Err(self.abort(err.into())),
        }
        Ok(())
    }
}

/// Incremental parser for an XMPP stream.
///
/// Bytes are pushed in as they arrive from the network, complete top level
/// elements are queued until they are pulled out with
/// [next_element()](StreamParser::next_element).
pub struct StreamParser {
    parser: SaxParser,
    builder: StreamBuilder,
}

impl StreamParser {
    pub fn new() -> Self {
        Self {
            parser: SaxParser::new(),
            builder: StreamBuilder::new(),
        }
    }

    /// Creates a parser which fails when a single token exceeds the limit.
    pub fn with_max_token_size(max_token_size: usize) -> Self {
        Self {
            parser: SaxParser::with_max_token_size(max_token_size),
            builder: StreamBuilder::new(),
        }
    }

    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        match self.parser.parse_bytes(&mut self.builder, bytes) {
            Ok(()) => Ok(()),
            Err(SaxError::HandlerAbort(msg)) => {
                Err(self.builder.error.take().unwrap_or(StreamError::BadStream(msg)))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Removes the oldest complete element from the queue.
    pub fn next_element(&mut self) -> Option<StreamElement> {
        self.builder.queue.pop_front()
    }

    /// True while an element is partially received.
    pub fn is_inside_element(&self) -> bool {
        self.builder.builder.depth() > 0
    }

    /// Parses the bytes and iterates over every element completed by them.
    ///
    /// A parse error is returned after the elements completed before it.
    pub fn elements(&mut self, bytes: &[u8]) -> Elements<'_> {
        let error = self.parse_bytes(bytes).err();
        Elements {
            parser: self,
            error,
        }
    }

    /// Discards all state for a stream restart.
    pub fn reset(&mut self) {
        self.parser.reset();
        self.builder.reset();
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Elements<'a> {
    parser: &'a mut StreamParser,
    error: Option<StreamError>,
}

impl Iterator for Elements<'_> {
    type Item = Result<StreamElement, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.parser.next_element() {
            Some(element) => Some(Ok(element)),
            None => self.error.take().map(Err),
        }
    }
}
