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

#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum JidError {
    #[error("invalid JabberID: {0}")]
    Malformed(&'static str),
}

pub(super) mod description {
    pub(in super::super) const DOMAIN_EMPTY: &str = "domainpart is empty";
    pub(in super::super) const DOMAIN_TOO_LONG: &str = "domainpart is longer than 1023 octets";
    pub(in super::super) const DOMAIN_FORBIDDEN_CHAR: &str =
        "domainpart contains a forbidden character";
    pub(in super::super) const LOCAL_EMPTY: &str = "localpart is empty";
    pub(in super::super) const LOCAL_TOO_LONG: &str = "localpart is longer than 1023 octets";
    pub(in super::super) const LOCAL_FORBIDDEN_CHAR: &str =
        "localpart contains a forbidden character";
    pub(in super::super) const RESOURCE_EMPTY: &str = "resourcepart is empty";
    pub(in super::super) const RESOURCE_TOO_LONG: &str = "resourcepart is longer than 1023 octets";
    pub(in super::super) const RESOURCE_FORBIDDEN_CHAR: &str =
        "resourcepart contains a forbidden character";
}
