/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Attention, also known as buzz (XEP-0224).

use async_trait::async_trait;
use tracing::debug;

use super::disco;
use crate::Element;
use crate::xmpp::Event;
use crate::xmpp::Extension;
use crate::xmpp::ExtensionError;
use crate::xmpp::Jid;
use crate::xmpp::Message;
use crate::xmpp::MessageType;
use crate::xmpp::Session;
use crate::xmpp::StanzaAttributes;
use crate::xmpp::constants::ATTENTION_NS;

/// Publishes attention requests from contacts.
pub struct Attention;

#[async_trait]
impl Extension for Attention {
    fn name(&self) -> &'static str {
        "attention"
    }

    async fn handle_message(&self, session: &Session, message: &Message) -> bool {
        if message.kind() == MessageType::Error
            || message
                .element()
                .find_tag_ns("attention", ATTENTION_NS)
                .is_none()
        {
            return false;
        }
        let Some(from) = message.from() else {
            return false;
        };
        debug!(%from, "attention requested");
        session.emit(Event::Attention {
            from,
            message: message.body(),
        });
        true
    }
}

/// Gets the attention of a contact.
///
/// Fails with [`ExtensionError::NotSupported`] unless the contact advertises
/// the protocol, so this needs a full jid of an available resource.
pub async fn buzz(session: &Session, jid: &Jid, message: Option<&str>) -> Result<(), ExtensionError> {
    let features = disco::get_features(session, jid).await?;
    if !features.iter().any(|feature| feature == ATTENTION_NS) {
        return Err(ExtensionError::NotSupported(ATTENTION_NS));
    }
    let mut buzz = Message::new(Some(jid), MessageType::Headline);
    buzz.set_body(message);
    buzz.add_payload(Element::with_namespace("attention", ATTENTION_NS));
    session.send(buzz).await?;
    Ok(())
}
