/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! XMPP ping (XEP-0199).

use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use super::is_get;
use crate::Element;
use crate::xmpp::ErrorCondition;
use crate::xmpp::Extension;
use crate::xmpp::ExtensionError;
use crate::xmpp::Iq;
use crate::xmpp::IqError;
use crate::xmpp::Jid;
use crate::xmpp::Session;
use crate::xmpp::constants::PING_NS;

/// Answers pings.
pub struct Ping;

#[async_trait]
impl Extension for Ping {
    fn name(&self) -> &'static str {
        "ping"
    }

    async fn handle_iq(&self, session: &Session, iq: &Iq) -> bool {
        if !is_get(iq, "ping", PING_NS) {
            return false;
        }
        if let Err(err) = session.send(iq.result_reply(None)).await {
            debug!(%err, "cannot answer ping");
        }
        true
    }
}

/// Pings an entity, returning the round trip time.
///
/// An entity answering with an error still counts as reachable if the
/// error is `service-unavailable` or `feature-not-implemented`, as it only
/// means the entity does not support the protocol.
pub async fn ping(session: &Session, jid: &Jid) -> Result<Duration, ExtensionError> {
    let started = Instant::now();
    let request = Iq::get(Some(jid), Element::with_namespace("ping", PING_NS));
    match session.request(request).await {
        Ok(_) => Ok(started.elapsed()),
        Err(IqError::Remote(error))
            if matches!(
                error.condition,
                ErrorCondition::ServiceUnavailable | ErrorCondition::FeatureNotImplemented
            ) =>
        {
            Ok(started.elapsed())
        }
        Err(err) => Err(err.into()),
    }
}
