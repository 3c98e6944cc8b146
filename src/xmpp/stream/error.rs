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

use crate::DocumentError;
use crate::SaxError;

#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum StreamError {
    #[error("not enough memory")]
    NoMemory,

    #[error("invalid XML syntax: {0}")]
    BadXml(&'static str),

    #[error("restricted XML construct: {0}")]
    RestrictedXml(&'static str),

    #[error("invalid stream protocol: {0}")]
    BadStream(&'static str),
}

impl From<SaxError> for StreamError {
    fn from(err: SaxError) -> Self {
        match err {
            SaxError::NoMemory => StreamError::NoMemory,
            SaxError::BadXml(msg) => StreamError::BadXml(msg),
            SaxError::NotSupported(msg) => StreamError::RestrictedXml(msg),
            SaxError::HandlerAbort(msg) => StreamError::BadStream(msg),
        }
    }
}

impl From<DocumentError> for StreamError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NoMemory => StreamError::NoMemory,
            DocumentError::BadXml(msg) => StreamError::BadXml(msg),
            DocumentError::NotSupported(msg) => StreamError::RestrictedXml(msg),
        }
    }
}

pub(super) mod description {
    pub(in super::super) const NOT_A_STREAM: &str = "root element is not <stream:stream>";
    pub(in super::super) const EMPTY_STREAM: &str = "stream header is an empty element";
    pub(in super::super) const TEXT_AT_STREAM_LEVEL: &str =
        "character data between stanzas must be whitespace";
    pub(in super::super) const STREAM_END_MISMATCH: &str =
        "stream is closed with a different tag";
}
