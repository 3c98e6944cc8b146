/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Application defined IQ requests carrying free-form text.
//!
//! The payload is `<query xmlns='urn:iksjab:customiq'>` with the text as its
//! content. Requests arriving without an installed handler get the default
//! `feature-not-implemented` reply.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::Element;
use crate::xmpp::Extension;
use crate::xmpp::ExtensionError;
use crate::xmpp::Iq;
use crate::xmpp::Jid;
use crate::xmpp::Session;
use crate::xmpp::StanzaAttributes;
use crate::xmpp::constants::CUSTOM_IQ_NS;
use crate::xmpp::error::description;

/// Answers a custom request from the given sender, `None` for no content.
pub type CustomIqHandler = Arc<dyn Fn(&Jid, &str) -> Option<String> + Send + Sync>;

/// Routes custom requests to the application's handler.
#[derive(Default)]
pub struct CustomIq {
    handler: RwLock<Option<CustomIqHandler>>,
}

impl CustomIq {
    pub fn new() -> Self {
        CustomIq::default()
    }

    pub fn set_handler(&self, handler: Option<CustomIqHandler>) {
        *self.handler.write() = handler;
    }
}

fn query(text: Option<&str>) -> Element {
    let query = Element::with_namespace("query", CUSTOM_IQ_NS);
    match text {
        Some(text) => query.with_text(text),
        None => query,
    }
}

#[async_trait]
impl Extension for CustomIq {
    fn name(&self) -> &'static str {
        "customiq"
    }

    async fn handle_iq(&self, session: &Session, iq: &Iq) -> bool {
        if !iq.is_request() {
            return false;
        }
        let Some(request) = iq.payload().filter(|query| query.is("query", CUSTOM_IQ_NS)) else {
            return false;
        };
        let Some(handler) = self.handler.read().clone() else {
            return false;
        };
        // No sender means our own server.
        let Some(from) = iq.from().or_else(|| {
            let jid = session.current_jid()?;
            Jid::parse(jid.domainpart()).ok()
        }) else {
            return false;
        };
        let answer = handler(&from, &request.text());
        let reply = iq.result_reply(Some(query(answer.as_deref())));
        if let Err(err) = session.send(reply).await {
            debug!(%err, "cannot answer custom request");
        }
        true
    }
}

/// Sends a custom request, returning the text of the answer if it has one.
pub async fn request_custom_iq(
    session: &Session,
    jid: &Jid,
    text: &str,
) -> Result<Option<String>, ExtensionError> {
    let request = Iq::get(Some(jid), query(Some(text)));
    let response = session.request(request).await?;
    match response.payload() {
        None => Ok(None),
        Some(query) if query.is("query", CUSTOM_IQ_NS) => {
            let text = query.text();
            Ok((!text.is_empty()).then_some(text))
        }
        Some(_) => Err(ExtensionError::BadResponse(description::MISSING_QUERY)),
    }
}
