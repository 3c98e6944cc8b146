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

use std::fmt::Display;

pub use error::SaxError;
use error::description;

/// An XML construct returned from the parser.
#[derive(Debug, Eq, PartialEq)]
pub enum SaxElement<'a> {
    /// A start tag or empty element tag.
    ///
    /// The argument is the full name of the tag, including any namespace
    /// prefix. This element is sent to the handler as soon as the name is parsed.
    StartTag(&'a str),

    /// A tag attribute for the last StartTag.
    ///
    /// All references in the attribute value are already replaced with the
    /// actual characters.
    Attribute(&'a str, &'a str),

    /// The last StartTag is complete and its content follows.
    StartTagContent,

    /// The last StartTag was an empty element tag and will have no content.
    StartTagEmpty,

    /// An end tag with the full name of the tag.
    EndTag(&'a str),

    /// A block of character data.
    ///
    /// A continuous block of text can be delivered in several parts when the
    /// input is passed in multiple parse calls. CDATA sections are delivered
    /// as ordinary character data.
    CData(&'a str),
}

pub trait SaxHandler {
    fn handle_element(&mut self, element: &SaxElement) -> Result<(), SaxError>;
}

/// A position in the parser input byte stream.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Location {
    /// Byte position in the input stream.
    pub bytes: usize,
    /// How many lines have been parsed.
    pub lines: usize,
    /// How many bytes after the last newline character.
    pub column: usize,
}

impl Location {
    fn advance(&mut self, c: u8) {
        self.bytes += 1;
        if c == b'\n' {
            self.lines += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "byte: {}, line: {}, column: {}",
            self.bytes, self.lines, self.column
        )
    }
}

/// Incremental SAX (Simple API for XML) parser for XMPP streams.
///
/// The parser processes the incoming bytes in arbitrary sized blocks and
/// invokes the handler for each encountered construct. It accepts the
/// restricted XML used by XMPP (RFC 6120 section 11): comments, document
/// type declarations, processing instructions after the XML declaration, and
/// entities other than the predefined five are rejected.
///
/// # Examples
///
/// ```
/// use iksjab::{SaxElement, SaxError, SaxHandler, SaxParser};
///
/// struct Counter { tags: usize }
/// impl SaxHandler for Counter {
///     fn handle_element(&mut self, element: &SaxElement) -> Result<(), SaxError> {
///         if let SaxElement::StartTag(_) = element {
///             self.tags += 1;
///         }
///         Ok(())
///     }
/// }
///
/// let mut counter = Counter { tags: 0 };
/// let mut parser = SaxParser::new();
/// parser.parse_bytes(&mut counter, b"<message><bo").unwrap();
/// parser.parse_bytes(&mut counter, b"dy>hi</body></message>").unwrap();
/// parser.parse_finish().unwrap();
/// assert_eq!(counter.tags, 2);
/// ```
pub struct SaxParser {
    state: State,
    depth: usize,
    seen_root: bool,
    failed: bool,
    is_end_tag: bool,
    in_value: bool,
    quote: u8,
    value_pos: usize,
    markup_pos: usize,
    buffer: Vec<u8>,
    ref_buffer: Vec<u8>,
    max_token_size: usize,
    location: Location,
}

#[derive(Debug, Eq, PartialEq)]
enum State {
    Prolog,
    Declaration,
    DeclarationEnd,
    TagStart,
    TagName,
    TagWhitespace,
    EmptyTagEnd,
    EndTagWhitespace,
    AttributeName,
    AttributeEq,
    AttributeValueStart,
    AttributeValue,
    AttributeEnd,
    CData,
    Reference,
    Markup,
    CDataSectionStart,
    CDataSectionBody,
    CDataSectionMaybeEnd,
    CDataSectionMaybeEnd2,
    Epilog,
}

const INITIAL_BUFFER_CAPACITY: usize = 128;

const DEFAULT_MAX_TOKEN_SIZE: usize = 1024 * 1024;

const REF_BUFFER_SIZE: usize = 8;

const CDATA_SECTION_START: &[u8] = b"[CDATA[";

macro_rules! whitespace {
    () => {
        b' ' | b'\t' | b'\r' | b'\n'
    };
}

macro_rules! xml_error {
    ($a:ident) => {
        return Err(SaxError::BadXml(description::$a))
    };
}

macro_rules! not_supported {
    ($a:ident) => {
        return Err(SaxError::NotSupported(description::$a))
    };
}

fn is_valid_xml_char(c: u32) -> bool {
    matches!(c, 0x09 | 0x0a | 0x0d | 0x20..=0xd7ff | 0xe000..=0xfffd | 0x10000..=0x10ffff)
}

fn as_str(bytes: &[u8]) -> Result<&str, SaxError> {
    std::str::from_utf8(bytes).map_err(|_| SaxError::BadXml(description::UTF8_INVALID))
}

fn decode_number(digits: &[u8], radix: u32) -> Result<char, SaxError> {
    let valid = match radix {
        16 => digits.iter().all(u8::is_ascii_hexdigit),
        _ => digits.iter().all(u8::is_ascii_digit),
    };
    if digits.is_empty() || !valid {
        xml_error!(REFERENCE_INVALID);
    }
    let value = u32::from_str_radix(as_str(digits)?, radix)
        .map_err(|_| SaxError::BadXml(description::REFERENCE_INVALID))?;
    if !is_valid_xml_char(value) {
        xml_error!(CHAR_INVALID);
    }
    char::from_u32(value).ok_or(SaxError::BadXml(description::CHAR_INVALID))
}

fn decode_reference(name: &[u8]) -> Result<char, SaxError> {
    match name {
        b"lt" => Ok('<'),
        b"gt" => Ok('>'),
        b"amp" => Ok('&'),
        b"apos" => Ok('\''),
        b"quot" => Ok('"'),
        [b'#', b'x', digits @ ..] => decode_number(digits, 16),
        [b'#', digits @ ..] => decode_number(digits, 10),
        [] => xml_error!(REFERENCE_INVALID),
        _ => not_supported!(REFERENCE_CUSTOM_ENTITY),
    }
}

impl SaxParser {
    /// Creates a new SAX parser instance.
    ///
    /// The instance can be reused for another stream with the [reset()](SaxParser::reset) method.
    pub fn new() -> SaxParser {
        SaxParser::with_max_token_size(DEFAULT_MAX_TOKEN_SIZE)
    }

    /// Creates a parser which fails with [SaxError::NoMemory] when a single
    /// name, attribute, or text block grows beyond the given size.
    pub fn with_max_token_size(max_token_size: usize) -> SaxParser {
        SaxParser {
            state: State::Prolog,
            depth: 0,
            seen_root: false,
            failed: false,
            is_end_tag: false,
            in_value: false,
            quote: 0,
            value_pos: 0,
            markup_pos: 0,
            buffer: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
            ref_buffer: Vec::with_capacity(REF_BUFFER_SIZE),
            max_token_size,
            location: Location::default(),
        }
    }

    /// Resets the parser into a clean state.
    pub fn reset(&mut self) {
        self.state = State::Prolog;
        self.depth = 0;
        self.seen_root = false;
        self.failed = false;
        self.is_end_tag = false;
        self.in_value = false;
        self.quote = 0;
        self.value_pos = 0;
        self.markup_pos = 0;
        self.buffer.clear();
        self.ref_buffer.clear();
        self.location = Location::default();
    }

    /// Position of the next byte to parse.
    ///
    /// After an error this is the position of the offending byte.
    pub fn location(&self) -> Location {
        self.location
    }

    /// Current element nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn push_byte(&mut self, c: u8) -> Result<(), SaxError> {
        if self.buffer.len() >= self.max_token_size {
            return Err(SaxError::NoMemory);
        }
        if self.buffer.len() == self.buffer.capacity() {
            let more = std::cmp::max(self.buffer.capacity(), INITIAL_BUFFER_CAPACITY);
            if self.buffer.try_reserve(more).is_err() {
                return Err(SaxError::NoMemory);
            }
        }
        self.buffer.push(c);
        Ok(())
    }

    fn push_char(&mut self, c: char) -> Result<(), SaxError> {
        let mut buf = [0u8; 4];
        for b in c.encode_utf8(&mut buf).bytes() {
            self.push_byte(b)?;
        }
        Ok(())
    }

    fn flush_cdata(&mut self, handler: &mut impl SaxHandler, partial: bool) -> Result<(), SaxError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let valid = match std::str::from_utf8(&self.buffer) {
            Ok(s) => s.len(),
            // Keep an incomplete trailing sequence for the next block
            Err(err) if partial && err.error_len().is_none() => err.valid_up_to(),
            Err(_) => xml_error!(UTF8_INVALID),
        };
        if valid > 0 {
            handler.handle_element(&SaxElement::CData(as_str(&self.buffer[..valid])?))?;
        }
        self.buffer.drain(..valid);
        Ok(())
    }

    fn emit_tag_name(&mut self, handler: &mut impl SaxHandler) -> Result<(), SaxError> {
        if self.buffer.is_empty() {
            xml_error!(TAG_EMPTY_NAME);
        }
        handler.handle_element(&SaxElement::StartTag(as_str(&self.buffer)?))?;
        self.buffer.clear();
        Ok(())
    }

    fn emit_attribute(&mut self, handler: &mut impl SaxHandler) -> Result<(), SaxError> {
        let (name, value) = self.buffer.split_at(self.value_pos);
        handler.handle_element(&SaxElement::Attribute(as_str(name)?, as_str(value)?))?;
        self.buffer.clear();
        Ok(())
    }

    fn start_content(&mut self, handler: &mut impl SaxHandler) -> Result<(), SaxError> {
        handler.handle_element(&SaxElement::StartTagContent)?;
        self.depth += 1;
        self.seen_root = true;
        self.state = State::CData;
        Ok(())
    }

    fn empty_tag(&mut self, handler: &mut impl SaxHandler) -> Result<(), SaxError> {
        handler.handle_element(&SaxElement::StartTagEmpty)?;
        self.seen_root = true;
        self.state = if self.depth == 0 {
            State::Epilog
        } else {
            State::CData
        };
        Ok(())
    }

    fn end_tag(&mut self, handler: &mut impl SaxHandler) -> Result<(), SaxError> {
        if self.buffer.is_empty() {
            xml_error!(TAG_EMPTY_NAME);
        }
        handler.handle_element(&SaxElement::EndTag(as_str(&self.buffer)?))?;
        self.buffer.clear();
        self.depth -= 1;
        self.state = if self.depth == 0 {
            State::Epilog
        } else {
            State::CData
        };
        Ok(())
    }

    /// Checks if the document is complete.
    ///
    /// XMPP streams never complete until the session ends, so this is only
    /// useful for standalone documents.
    pub fn parse_finish(&mut self) -> Result<(), SaxError> {
        if !self.seen_root {
            xml_error!(DOC_NO_CONTENT);
        }
        if self.depth > 0 {
            xml_error!(DOC_OPEN_TAGS);
        }
        if self.state != State::Epilog {
            xml_error!(DOC_OPEN_MARKUP);
        }
        Ok(())
    }

    /// Parses given XML bytes and checks if the document is complete.
    pub fn parse_bytes_finish(
        &mut self,
        handler: &mut impl SaxHandler,
        bytes: &[u8],
    ) -> Result<(), SaxError> {
        self.parse_bytes(handler, bytes)?;
        self.parse_finish()
    }

    /// Parses given XML bytes.
    ///
    /// After an error the parser refuses further input until it is
    /// [reset](SaxParser::reset).
    pub fn parse_bytes(
        &mut self,
        handler: &mut impl SaxHandler,
        bytes: &[u8],
    ) -> Result<(), SaxError> {
        if self.failed {
            xml_error!(PARSER_REUSE_WITHOUT_RESET);
        }
        let result = self.parse_block(handler, bytes);
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn parse_block(&mut self, handler: &mut impl SaxHandler, bytes: &[u8]) -> Result<(), SaxError> {
        for &c in bytes {
            if c < 0x20 && !matches!(c, whitespace!()) {
                xml_error!(CHAR_INVALID);
            }

            match self.state {
                State::Prolog => match c {
                    b'<' => self.state = State::TagStart,
                    whitespace!() => (),
                    _ => xml_error!(DOC_CDATA_WITHOUT_PARENT),
                },

                State::Declaration => {
                    if c == b'?' {
                        self.state = State::DeclarationEnd;
                    }
                }

                State::DeclarationEnd => match c {
                    b'>' => self.state = State::Prolog,
                    b'?' => (),
                    _ => self.state = State::Declaration,
                },

                State::TagStart => match c {
                    b'/' => {
                        if self.depth == 0 {
                            xml_error!(TAG_CLOSE_WITHOUT_OPEN);
                        }
                        self.is_end_tag = true;
                        self.state = State::TagName;
                    }
                    b'?' => {
                        if self.seen_root {
                            not_supported!(PROCESSING_INSTRUCTION);
                        }
                        self.state = State::Declaration;
                    }
                    b'!' => {
                        self.markup_pos = 0;
                        self.state = State::Markup;
                    }
                    whitespace!() => xml_error!(TAG_WHITESPACE_START),
                    b'>' => xml_error!(TAG_EMPTY_NAME),
                    b'<' | b'=' | b'"' | b'\'' | b'&' => xml_error!(TAG_BAD_NAME),
                    _ => {
                        self.is_end_tag = false;
                        self.push_byte(c)?;
                        self.state = State::TagName;
                    }
                },

                State::TagName => match c {
                    whitespace!() => {
                        if self.is_end_tag {
                            if self.buffer.is_empty() {
                                xml_error!(TAG_WHITESPACE_START);
                            }
                            self.state = State::EndTagWhitespace;
                        } else {
                            self.emit_tag_name(handler)?;
                            self.state = State::TagWhitespace;
                        }
                    }
                    b'/' => {
                        if self.is_end_tag {
                            xml_error!(TAG_DOUBLE_END);
                        }
                        self.emit_tag_name(handler)?;
                        self.state = State::EmptyTagEnd;
                    }
                    b'>' => {
                        if self.is_end_tag {
                            self.end_tag(handler)?;
                        } else {
                            self.emit_tag_name(handler)?;
                            self.start_content(handler)?;
                        }
                    }
                    b'<' | b'=' | b'"' | b'\'' | b'&' => xml_error!(TAG_BAD_NAME),
                    _ => self.push_byte(c)?,
                },

                State::EndTagWhitespace => match c {
                    whitespace!() => (),
                    b'>' => self.end_tag(handler)?,
                    _ => xml_error!(TAG_END_TAG_ATTRIBUTES),
                },

                State::TagWhitespace => match c {
                    whitespace!() => (),
                    b'/' => self.state = State::EmptyTagEnd,
                    b'>' => self.start_content(handler)?,
                    b'<' | b'=' | b'"' | b'\'' => xml_error!(TAG_ATTRIBUTE_BAD_NAME),
                    _ => {
                        self.push_byte(c)?;
                        self.state = State::AttributeName;
                    }
                },

                State::EmptyTagEnd => match c {
                    b'>' => self.empty_tag(handler)?,
                    _ => xml_error!(TAG_EMPTY_TAG_MISSING_END),
                },

                State::AttributeName => match c {
                    b'=' => {
                        self.value_pos = self.buffer.len();
                        self.state = State::AttributeValueStart;
                    }
                    whitespace!() => self.state = State::AttributeEq,
                    b'/' | b'<' | b'>' | b'"' | b'\'' => xml_error!(TAG_ATTRIBUTE_BAD_NAME),
                    _ => self.push_byte(c)?,
                },

                State::AttributeEq => match c {
                    whitespace!() => (),
                    b'=' => {
                        self.value_pos = self.buffer.len();
                        self.state = State::AttributeValueStart;
                    }
                    _ => xml_error!(TAG_ATTRIBUTE_WITHOUT_EQUAL),
                },

                State::AttributeValueStart => match c {
                    whitespace!() => (),
                    b'"' | b'\'' => {
                        self.quote = c;
                        self.state = State::AttributeValue;
                    }
                    _ => xml_error!(TAG_ATTRIBUTE_WITHOUT_QUOTE),
                },

                State::AttributeValue => {
                    if c == self.quote {
                        self.emit_attribute(handler)?;
                        self.state = State::AttributeEnd;
                    } else {
                        match c {
                            b'<' => xml_error!(TAG_ATTRIBUTE_BAD_VALUE),
                            b'&' => {
                                self.in_value = true;
                                self.ref_buffer.clear();
                                self.state = State::Reference;
                            }
                            // Attribute value normalization
                            b'\t' | b'\r' | b'\n' => self.push_byte(b' ')?,
                            _ => self.push_byte(c)?,
                        }
                    }
                }

                State::AttributeEnd => match c {
                    whitespace!() => self.state = State::TagWhitespace,
                    b'/' => self.state = State::EmptyTagEnd,
                    b'>' => self.start_content(handler)?,
                    _ => xml_error!(TAG_ATTRIBUTE_WITHOUT_SPACE),
                },

                State::CData => match c {
                    b'<' => {
                        self.flush_cdata(handler, false)?;
                        self.state = State::TagStart;
                    }
                    b'&' => {
                        self.in_value = false;
                        self.ref_buffer.clear();
                        self.state = State::Reference;
                    }
                    _ => self.push_byte(c)?,
                },

                State::Reference => match c {
                    b';' => {
                        let decoded = decode_reference(&self.ref_buffer)?;
                        self.push_char(decoded)?;
                        self.state = if self.in_value {
                            State::AttributeValue
                        } else {
                            State::CData
                        };
                    }
                    _ => {
                        if self.ref_buffer.len() >= REF_BUFFER_SIZE
                            || !(c.is_ascii_alphanumeric() || c == b'#')
                        {
                            xml_error!(REFERENCE_INVALID);
                        }
                        self.ref_buffer.push(c);
                    }
                },

                State::Markup => match c {
                    b'[' => {
                        if self.depth == 0 {
                            xml_error!(MARKUP_CDATA_SECTION_OUTSIDE_ROOT);
                        }
                        self.markup_pos = 1;
                        self.state = State::CDataSectionStart;
                    }
                    b'-' => not_supported!(COMMENT),
                    b'D' => not_supported!(DOCTYPE),
                    _ => xml_error!(MARKUP_UNRECOGNIZED),
                },

                State::CDataSectionStart => {
                    if c != CDATA_SECTION_START[self.markup_pos] {
                        xml_error!(MARKUP_CDATA_SECTION_BAD_START);
                    }
                    self.markup_pos += 1;
                    if self.markup_pos == CDATA_SECTION_START.len() {
                        self.state = State::CDataSectionBody;
                    }
                }

                State::CDataSectionBody => match c {
                    b']' => self.state = State::CDataSectionMaybeEnd,
                    _ => self.push_byte(c)?,
                },

                State::CDataSectionMaybeEnd => match c {
                    b']' => self.state = State::CDataSectionMaybeEnd2,
                    _ => {
                        self.push_byte(b']')?;
                        self.push_byte(c)?;
                        self.state = State::CDataSectionBody;
                    }
                },

                State::CDataSectionMaybeEnd2 => match c {
                    b'>' => self.state = State::CData,
                    b']' => self.push_byte(b']')?,
                    _ => {
                        self.push_byte(b']')?;
                        self.push_byte(b']')?;
                        self.push_byte(c)?;
                        self.state = State::CDataSectionBody;
                    }
                },

                State::Epilog => match c {
                    whitespace!() => (),
                    b'<' => xml_error!(TAG_OUTSIDE_ROOT),
                    _ => xml_error!(DOC_CDATA_WITHOUT_PARENT),
                },
            }
            self.location.advance(c);
        }

        if self.state == State::CData {
            self.flush_cdata(handler, true)?;
        }
        Ok(())
    }
}

impl Default for SaxParser {
    fn default() -> Self {
        Self::new()
    }
}
