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

use super::JidError;
use super::RemoteError;
use super::SaslError;
use super::StanzaError;
use super::StreamError;
use super::TransportError;

/// Failure to establish a session.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed XML from server: {0}")]
    MalformedXml(#[from] StreamError),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("resource binding failed: {0}")]
    BindingFailed(String),

    #[error("required extension {name} failed to initialize: {source}")]
    ExtensionInitFailed {
        name: &'static str,
        source: ExtensionError,
    },

    #[error("timed out")]
    Timeout,

    #[error("TLS failure: {0}")]
    Tls(String),

    #[error("stream failure: {0}")]
    Stream(String),

    #[error("session is already connected")]
    AlreadyConnected,

    #[error("roster fetch failed: {0}")]
    Roster(IqError),

    #[error("connection attempt was cancelled")]
    Cancelled,
}

impl From<TransportError> for ConnectError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Io(err) => ConnectError::Io(err),
            TransportError::MalformedXml(err) => ConnectError::MalformedXml(err),
            TransportError::UnexpectedEof => ConnectError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed in the middle of the stream",
            )),
            TransportError::Tls(msg) => ConnectError::Tls(msg),
            TransportError::Timeout => ConnectError::Timeout,
            err @ (TransportError::StreamClosed
            | TransportError::StreamError(_)
            | TransportError::BadStream(_)) => ConnectError::Stream(err.to_string()),
        }
    }
}

impl From<SaslError> for ConnectError {
    fn from(err: SaslError) -> Self {
        ConnectError::AuthenticationFailed(err.to_string())
    }
}

/// Failure of an IQ request.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum IqError {
    #[error("no response in time")]
    Timeout,

    #[error("remote error: {0}")]
    Remote(RemoteError),

    #[error("request cancelled by session close")]
    Cancelled,

    #[error("session is not established")]
    NotConnected,

    #[error("a request with id '{0}' is already pending")]
    DuplicateId(String),
}

/// Failure of an extension operation or initialization.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ExtensionError {
    #[error(transparent)]
    Iq(#[from] IqError),

    #[error("unexpected response: {0}")]
    BadResponse(&'static str),

    #[error("entity does not support {0}")]
    NotSupported(&'static str),

    #[error(transparent)]
    Jid(#[from] JidError),

    #[error(transparent)]
    Stanza(#[from] StanzaError),
}

pub(super) mod description {
    pub(in super::super) const NO_STARTTLS: &str = "server does not offer STARTTLS";
    pub(in super::super) const TLS_REFUSED: &str = "server refused STARTTLS";
    pub(in super::super) const NO_MECHANISMS: &str = "server offers no SASL mechanisms";
    pub(in super::super) const NO_PASSWORD: &str = "no password configured";
    pub(in super::super) const NO_BIND: &str = "server does not offer resource binding";
    pub(in super::super) const BIND_NO_JID: &str = "bind result has no valid jid";
    pub(in super::super) const UNEXPECTED_ELEMENT: &str = "unexpected element during negotiation";
    pub(in super::super) const NOT_FEATURES: &str = "expected stream features";
    pub(in super::super) const MISSING_QUERY: &str = "response has no query payload";
    pub(in super::super) const NO_VERSION_NAME: &str = "version response has no name";
    pub(in super::super) const BAD_ITEM: &str = "item without a valid jid";
    pub(in super::super) const BAD_TIME: &str = "time response has no valid utc and tzo";
    pub(in super::super) const BAD_PRIVACY_LIST: &str = "response has no privacy list";
    pub(in super::super) const BAD_PRIVACY_RULE: &str = "privacy rule has a bad action or order";
}
