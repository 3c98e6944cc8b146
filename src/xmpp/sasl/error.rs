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

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum SaslError {
    #[error("no supported SASL mechanism offered by the server")]
    NoCommonMechanism,

    #[error("invalid SASL exchange: {0}")]
    BadExchange(&'static str),

    #[error("server signature does not match")]
    ServerSignatureMismatch,

    #[error("server reported SCRAM error: {0}")]
    ServerError(String),
}

pub(super) mod description {
    pub(in super::super) const UNEXPECTED_CHALLENGE: &str = "challenge received in wrong state";
    pub(in super::super) const BAD_ENCODING: &str = "challenge is not valid UTF-8";
    pub(in super::super) const MISSING_ATTRIBUTE: &str = "required attribute is missing";
    pub(in super::super) const NONCE_MISMATCH: &str = "server nonce does not extend client nonce";
    pub(in super::super) const BAD_SALT: &str = "salt is not valid base64";
    pub(in super::super) const BAD_ITERATIONS: &str = "iteration count is not a positive number";
    pub(in super::super) const TOO_MANY_ITERATIONS: &str = "iteration count is unreasonably high";
    pub(in super::super) const BAD_SIGNATURE: &str = "verifier is not valid base64";
    pub(in super::super) const UNEXPECTED_SUCCESS: &str = "success received before the exchange ended";
    pub(in super::super) const BAD_KEY: &str = "cannot key the HMAC";
}
