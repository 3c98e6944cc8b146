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

use crate::xmpp::StreamError;

/// Failure of the XML stream transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed XML from peer: {0}")]
    MalformedXml(#[from] StreamError),

    #[error("connection closed in the middle of the stream")]
    UnexpectedEof,

    #[error("TLS failure: {0}")]
    Tls(String),

    #[error("peer closed the stream")]
    StreamClosed,

    #[error("stream error from peer: {0}")]
    StreamError(String),

    #[error("stream protocol violation: {0}")]
    BadStream(&'static str),

    #[error("timed out")]
    Timeout,
}

pub(super) mod description {
    pub(in super::super) const HEADER_NAMESPACE: &str =
        "stream header has the wrong namespace";
    pub(in super::super) const HEADER_VERSION: &str = "stream version 1.0 is not supported";
    pub(in super::super) const UNEXPECTED_HEADER: &str = "stream header in the middle of the stream";
}
