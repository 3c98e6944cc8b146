/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Service discovery (XEP-0030).

use async_trait::async_trait;
use tracing::debug;

use super::is_get;
use crate::Element;
use crate::xmpp::Extension;
use crate::xmpp::ExtensionError;
use crate::xmpp::Iq;
use crate::xmpp::Jid;
use crate::xmpp::Session;
use crate::xmpp::constants::DISCO_INFO_NS;
use crate::xmpp::constants::DISCO_ITEMS_NS;
use crate::xmpp::error::description;

/// What kind of entity something is, e.g. `client/pc` or `conference/text`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Identity {
    pub category: String,
    pub kind: String,
    pub name: Option<String>,
}

impl Identity {
    fn from_element(identity: &Element) -> Option<Identity> {
        Some(Identity {
            category: identity.attribute("category")?.to_string(),
            kind: identity.attribute("type")?.to_string(),
            name: identity.attribute("name").map(str::to_string),
        })
    }

    fn to_element(&self) -> Element {
        let mut identity = Element::new("identity")
            .with_attribute("category", self.category.as_str())
            .with_attribute("type", self.kind.as_str());
        if let Some(name) = &self.name {
            identity.set_attribute("name", Some(name.clone()));
        }
        identity
    }
}

/// An entity listed by a disco#items query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiscoItem {
    pub jid: Jid,
    pub node: Option<String>,
    pub name: Option<String>,
}

/// Answers disco#info queries about ourselves.
pub struct Disco {
    identity: Identity,
}

impl Disco {
    pub fn new(client_name: &str) -> Self {
        Disco {
            identity: Identity {
                category: "client".to_string(),
                kind: "pc".to_string(),
                name: Some(client_name.to_string()),
            },
        }
    }

    fn info(&self, session: &Session) -> Element {
        let mut query = Element::with_namespace("query", DISCO_INFO_NS);
        query.push_child(self.identity.to_element());
        for feature in session.features() {
            query.push_child(Element::new("feature").with_attribute("var", feature));
        }
        query
    }
}

#[async_trait]
impl Extension for Disco {
    fn name(&self) -> &'static str {
        "disco"
    }

    async fn handle_iq(&self, session: &Session, iq: &Iq) -> bool {
        let reply = if is_get(iq, "query", DISCO_INFO_NS) {
            iq.result_reply(Some(self.info(session)))
        } else if is_get(iq, "query", DISCO_ITEMS_NS) {
            // A client has no items of its own
            iq.result_reply(Some(Element::with_namespace("query", DISCO_ITEMS_NS)))
        } else {
            return false;
        };
        if let Err(err) = session.send(reply).await {
            debug!(%err, "cannot answer disco query");
        }
        true
    }
}

async fn query(session: &Session, jid: &Jid, namespace: &str) -> Result<Element, ExtensionError> {
    let response = session
        .request(Iq::get(Some(jid), Element::with_namespace("query", namespace)))
        .await?;
    response
        .payload()
        .filter(|query| query.is("query", namespace))
        .cloned()
        .ok_or(ExtensionError::BadResponse(description::MISSING_QUERY))
}

/// The disco#info payload of an entity.
pub(crate) async fn get_info(session: &Session, jid: &Jid) -> Result<Element, ExtensionError> {
    query(session, jid, DISCO_INFO_NS).await
}

pub(crate) fn info_features(info: &Element) -> Vec<String> {
    info.tags()
        .filter(|tag| tag.name() == "feature")
        .filter_map(|feature| feature.attribute("var"))
        .map(str::to_string)
        .collect()
}

pub(crate) fn info_identities(info: &Element) -> Vec<Identity> {
    info.tags()
        .filter(|tag| tag.name() == "identity")
        .filter_map(Identity::from_element)
        .collect()
}

/// Features an entity supports.
pub async fn get_features(session: &Session, jid: &Jid) -> Result<Vec<String>, ExtensionError> {
    Ok(info_features(&get_info(session, jid).await?))
}

pub async fn get_identities(session: &Session, jid: &Jid) -> Result<Vec<Identity>, ExtensionError> {
    Ok(info_identities(&get_info(session, jid).await?))
}

/// Entities associated with an entity, such as the rooms of a MUC service.
pub async fn get_items(session: &Session, jid: &Jid) -> Result<Vec<DiscoItem>, ExtensionError> {
    let items = query(session, jid, DISCO_ITEMS_NS).await?;
    items
        .tags()
        .filter(|tag| tag.name() == "item")
        .map(|item| {
            let jid = item
                .attribute("jid")
                .ok_or(ExtensionError::BadResponse(description::BAD_ITEM))?;
            Ok(DiscoItem {
                jid: Jid::parse(jid)?,
                node: item.attribute("node").map(str::to_string),
                name: item.attribute("name").map(str::to_string),
            })
        })
        .collect()
}
