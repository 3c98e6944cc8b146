/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use thiserror::Error;

/// Type of the error which happened during the XML SAX parsing.
///
/// These categories are designed to be as few as possible and correspond to the distinct
/// actions the caller might take based on the problem. The location of the error is
/// available via the [location()](super::SaxParser::location) method.
#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum SaxError {
    /// Parser could not allocate the memory needed for parsing buffers, or a single
    /// token grew beyond the configured maximum size.
    #[error("not enough memory")]
    NoMemory,

    /// A syntax error is encountered in the XML input.
    #[error("invalid xml syntax: {0}")]
    BadXml(&'static str),

    /// A well-formed XML construct which is not allowed in XMPP streams.
    ///
    /// Comments, processing instructions after the prolog, document type
    /// declarations and custom entities are rejected.
    #[error("xml construct not allowed: {0}")]
    NotSupported(&'static str),

    /// Element handler function returned this error.
    ///
    /// This is intended for caller's handler to be able to abort the processing while
    /// signalling to the caller that the interruption is not caused by the parser itself.
    #[error("handler aborted: {0}")]
    HandlerAbort(&'static str),
}

pub(super) mod description {
    pub(in super::super) const PARSER_REUSE_WITHOUT_RESET: &str =
        "cannot continue after an error without a reset";
    pub(in super::super) const UTF8_INVALID: &str = "invalid UTF-8 sequence";
    pub(in super::super) const CHAR_INVALID: &str = "invalid XML character";
    pub(in super::super) const DOC_NO_CONTENT: &str = "document has no root tag";
    pub(in super::super) const DOC_OPEN_TAGS: &str = "document has unclosed tags";
    pub(in super::super) const DOC_OPEN_MARKUP: &str = "document ends inside markup";
    pub(in super::super) const DOC_CDATA_WITHOUT_PARENT: &str =
        "character data not allowed outside of the root tag";
    pub(in super::super) const TAG_CLOSE_WITHOUT_OPEN: &str = "close tag without open";
    pub(in super::super) const TAG_WHITESPACE_START: &str = "tag cannot start with whitespace";
    pub(in super::super) const TAG_OUTSIDE_ROOT: &str = "tags cannot be outside of the root tag";
    pub(in super::super) const TAG_EMPTY_NAME: &str = "tag has no name";
    pub(in super::super) const TAG_BAD_NAME: &str = "tag names cannot have markup characters";
    pub(in super::super) const TAG_DOUBLE_END: &str = "end tag has standalone ending too";
    pub(in super::super) const TAG_END_TAG_ATTRIBUTES: &str = "end tag cannot have attributes";
    pub(in super::super) const TAG_EMPTY_TAG_MISSING_END: &str =
        "empty element tags must end after the '/'";
    pub(in super::super) const TAG_ATTRIBUTE_WITHOUT_EQUAL: &str =
        "tag attributes must have '=' before the value";
    pub(in super::super) const TAG_ATTRIBUTE_WITHOUT_QUOTE: &str =
        "tag attribute value must be in double or single quotes";
    pub(in super::super) const TAG_ATTRIBUTE_WITHOUT_SPACE: &str =
        "tag attributes must be separated by whitespace";
    pub(in super::super) const TAG_ATTRIBUTE_BAD_NAME: &str =
        "tag attribute names cannot have '/', '<' or '>'";
    pub(in super::super) const TAG_ATTRIBUTE_BAD_VALUE: &str =
        "tag attribute value cannot have '<' character without a reference";
    pub(in super::super) const REFERENCE_INVALID: &str = "malformed character reference";
    pub(in super::super) const REFERENCE_CUSTOM_ENTITY: &str =
        "non-predefined entity references are not supported";
    pub(in super::super) const MARKUP_CDATA_SECTION_BAD_START: &str =
        "character data sections must start with '[CDATA['";
    pub(in super::super) const MARKUP_CDATA_SECTION_OUTSIDE_ROOT: &str =
        "character data sections cannot be outside of the root tag";
    pub(in super::super) const MARKUP_UNRECOGNIZED: &str =
        "markup is not a character data section";
    pub(in super::super) const COMMENT: &str = "comments";
    pub(in super::super) const DOCTYPE: &str = "document type declarations";
    pub(in super::super) const PROCESSING_INSTRUCTION: &str =
        "processing instructions after the prolog";
}
