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

/// Local validation failure while viewing an element as a stanza.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum StanzaError {
    #[error("expected <{expected}> element, found <{found}>")]
    WrongRootElement {
        expected: &'static str,
        found: String,
    },

    #[error("unknown type attribute value '{0}'")]
    BadType(String),

    #[error("iq stanza has no id attribute")]
    MissingId,
}
