/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Blocking command (XEP-0191).

use async_trait::async_trait;
use tracing::debug;

use crate::Element;
use crate::xmpp::Extension;
use crate::xmpp::ExtensionError;
use crate::xmpp::Iq;
use crate::xmpp::IqType;
use crate::xmpp::Jid;
use crate::xmpp::Session;
use crate::xmpp::constants::BLOCKING_NS;
use crate::xmpp::im::is_from_server;
use crate::xmpp::error::description;

/// Acknowledges block and unblock pushes from the server.
pub struct Blocking;

#[async_trait]
impl Extension for Blocking {
    fn name(&self) -> &'static str {
        "blocking"
    }

    async fn handle_iq(&self, session: &Session, iq: &Iq) -> bool {
        let is_push = iq.kind() == IqType::Set
            && iq.payload().is_some_and(|payload| {
                payload.is("block", BLOCKING_NS) || payload.is("unblock", BLOCKING_NS)
            });
        if !is_push {
            return false;
        }
        if !is_from_server(session, iq) {
            return false;
        }
        debug!(kind = iq.payload().map(Element::name), "blocklist push");
        if let Err(err) = session.send(iq.result_reply(None)).await {
            debug!(%err, "cannot acknowledge blocklist push");
        }
        true
    }
}

fn items(command: &str, jids: &[Jid]) -> Element {
    let mut command = Element::with_namespace(command, BLOCKING_NS);
    for jid in jids {
        command.push_child(Element::new("item").with_attribute("jid", jid.to_string()));
    }
    command
}

/// Blocks all communication with the given entities.
pub async fn block(session: &Session, jids: &[Jid]) -> Result<(), ExtensionError> {
    session.request(Iq::set(None, items("block", jids))).await?;
    Ok(())
}

/// Unblocks the given entities, or everyone if the list is empty.
pub async fn unblock(session: &Session, jids: &[Jid]) -> Result<(), ExtensionError> {
    session.request(Iq::set(None, items("unblock", jids))).await?;
    Ok(())
}

pub async fn get_blocklist(session: &Session) -> Result<Vec<Jid>, ExtensionError> {
    let response = session
        .request(Iq::get(None, Element::with_namespace("blocklist", BLOCKING_NS)))
        .await?;
    let blocklist = response
        .payload()
        .filter(|payload| payload.is("blocklist", BLOCKING_NS))
        .ok_or(ExtensionError::BadResponse(description::MISSING_QUERY))?;
    blocklist
        .tags()
        .filter(|tag| tag.name() == "item")
        .map(|item| {
            let jid = item
                .attribute("jid")
                .ok_or(ExtensionError::BadResponse(description::BAD_ITEM))?;
            Ok(Jid::parse(jid)?)
        })
        .collect()
}
