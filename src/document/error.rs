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

use crate::SaxError;

#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum DocumentError {
    #[error("not enough memory")]
    NoMemory,

    #[error("invalid XML syntax: {0}")]
    BadXml(&'static str),

    #[error("XML construct not allowed: {0}")]
    NotSupported(&'static str),
}

impl From<SaxError> for DocumentError {
    fn from(err: SaxError) -> Self {
        match err {
            SaxError::NoMemory => DocumentError::NoMemory,
            SaxError::BadXml(msg) => DocumentError::BadXml(msg),
            SaxError::NotSupported(msg) => DocumentError::NotSupported(msg),
            SaxError::HandlerAbort(msg) => DocumentError::BadXml(msg),
        }
    }
}

impl From<DocumentError> for SaxError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NoMemory => SaxError::NoMemory,
            DocumentError::BadXml(msg) => SaxError::HandlerAbort(msg),
            DocumentError::NotSupported(msg) => SaxError::NotSupported(msg),
        }
    }
}

pub(super) mod description {
    pub(in super::super) const NO_DOCUMENT: &str = "no document parsed yet";
    pub(in super::super) const NO_START_TAG: &str = "content without an open tag";
    pub(in super::super) const TAG_MISMATCH: &str = "start and end tags have different names";
    pub(in super::super) const DUPLICATE_ATTRIBUTE: &str =
        "attribute name already used in this tag";
}
