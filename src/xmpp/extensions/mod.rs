/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Protocol extensions registered on every client.

pub mod attention;
pub mod blocking;
pub mod chatstates;
pub mod custom;
pub mod disco;
pub mod muc;
pub mod ping;
pub mod privacy;
pub mod time;
pub mod version;

use std::sync::Arc;

use crate::xmpp::ClientConfig;
use crate::xmpp::ConnectError;
use crate::xmpp::Iq;
use crate::xmpp::IqType;
use crate::xmpp::Session;
use crate::xmpp::constants::ATTENTION_NS;
use crate::xmpp::constants::BLOCKING_NS;
use crate::xmpp::constants::CHATSTATES_NS;
use crate::xmpp::constants::DISCO_INFO_NS;
use crate::xmpp::constants::MUC_NS;
use crate::xmpp::constants::PING_NS;
use crate::xmpp::constants::PRIVACY_NS;
use crate::xmpp::constants::TIME_NS;
use crate::xmpp::constants::VERSION_NS;

/// Registers the built-in extensions, in dispatch order.
pub fn register_defaults(session: &Session, config: &ClientConfig) -> Result<(), ConnectError> {
    session.register(
        Arc::new(disco::Disco::new(&config.client_name)),
        &[DISCO_INFO_NS],
    )?;
    session.register(Arc::new(ping::Ping), &[PING_NS])?;
    session.register(
        Arc::new(version::Version::new(
            &config.client_name,
            &config.client_version,
        )),
        &[VERSION_NS],
    )?;
    session.register(Arc::new(blocking::Blocking), &[BLOCKING_NS])?;
    session.register(Arc::new(muc::Muc), &[MUC_NS])?;
    session.register(Arc::new(time::Time), &[TIME_NS])?;
    session.register(Arc::new(privacy::Privacy), &[PRIVACY_NS])?;
    session.register(Arc::new(attention::Attention), &[ATTENTION_NS])?;
    session.register(Arc::new(chatstates::ChatStates), &[CHATSTATES_NS])?;
    Ok(())
}

/// True for a `get` request whose payload is the given element.
fn is_get(iq: &Iq, name: &str, namespace: &str) -> bool {
    iq.kind() == IqType::Get
        && iq
            .payload()
            .is_some_and(|payload| payload.is(name, namespace))
}

#[cfg(test)]
mod tests;
