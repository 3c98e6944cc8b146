/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Privacy lists (XEP-0016).
//!
//! Lists are stored on the server. The active list applies to this session
//! only, the default list to sessions without an active list.

use async_trait::async_trait;
use tracing::debug;

use crate::Element;
use crate::xmpp::Extension;
use crate::xmpp::ExtensionError;
use crate::xmpp::Iq;
use crate::xmpp::IqType;
use crate::xmpp::Jid;
use crate::xmpp::Session;
use crate::xmpp::Subscription;
use crate::xmpp::constants::PRIVACY_NS;
use crate::xmpp::error::description;
use crate::xmpp::im::is_from_server;

/// Stanza kinds a rule can be limited to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PrivacyStanza {
    Message,
    Iq,
    PresenceIn,
    PresenceOut,
}

impl PrivacyStanza {
    const ALL: [PrivacyStanza; 4] = [
        PrivacyStanza::Message,
        PrivacyStanza::Iq,
        PrivacyStanza::PresenceIn,
        PrivacyStanza::PresenceOut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStanza::Message => "message",
            PrivacyStanza::Iq => "iq",
            PrivacyStanza::PresenceIn => "presence-in",
            PrivacyStanza::PresenceOut => "presence-out",
        }
    }

    fn parse(name: &str) -> Option<PrivacyStanza> {
        PrivacyStanza::ALL
            .into_iter()
            .find(|stanza| stanza.as_str() == name)
    }
}

/// Whom a rule matches.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RuleTarget {
    /// Fall-through rule matching everyone.
    All,
    Jid(Jid),
    Group(String),
    Subscription(Subscription),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrivacyRule {
    pub target: RuleTarget,
    pub allow: bool,
    /// Rules are evaluated in ascending order.
    pub order: u32,
    /// Stanza kinds the rule applies to, all of them when empty.
    pub stanzas: Vec<PrivacyStanza>,
}

impl PrivacyRule {
    pub fn from_element(item: &Element) -> Result<Self, ExtensionError> {
        let bad_rule = ExtensionError::BadResponse(description::BAD_PRIVACY_RULE);
        let value = item.attribute("value");
        let target = match (item.attribute("type"), value) {
            (None, _) => RuleTarget::All,
            (Some("jid"), Some(value)) => RuleTarget::Jid(Jid::parse(value)?),
            (Some("group"), Some(value)) => RuleTarget::Group(value.to_string()),
            (Some("subscription"), Some(value)) => match value.parse() {
                Ok(Subscription::Remove) | Err(()) => return Err(bad_rule),
                Ok(subscription) => RuleTarget::Subscription(subscription),
            },
            _ => return Err(bad_rule),
        };
        let allow = match item.attribute("action") {
            Some("allow") => true,
            Some("deny") => false,
            _ => return Err(bad_rule),
        };
        let order = item
            .attribute("order")
            .and_then(|order| order.parse().ok())
            .ok_or(bad_rule)?;
        let stanzas = item
            .tags()
            .filter_map(|tag| PrivacyStanza::parse(tag.name()))
            .collect();
        Ok(PrivacyRule {
            target,
            allow,
            order,
            stanzas,
        })
    }

    pub fn to_element(&self) -> Element {
        let mut item = Element::new("item");
        match &self.target {
            RuleTarget::All => {}
            RuleTarget::Jid(jid) => {
                item = item
                    .with_attribute("type", "jid")
                    .with_attribute("value", jid.to_string());
            }
            RuleTarget::Group(group) => {
                item = item
                    .with_attribute("type", "group")
                    .with_attribute("value", group.as_str());
            }
            RuleTarget::Subscription(subscription) => {
                item = item
                    .with_attribute("type", "subscription")
                    .with_attribute("value", subscription.as_str());
            }
        }
        item = item
            .with_attribute("action", if self.allow { "allow" } else { "deny" })
            .with_attribute("order", self.order.to_string());
        for stanza in &self.stanzas {
            item.push_child(Element::new(stanza.as_str()));
        }
        item
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PrivacyList {
    pub name: String,
    pub rules: Vec<PrivacyRule>,
}

impl PrivacyList {
    pub fn new(name: &str) -> Self {
        PrivacyList {
            name: name.to_string(),
            rules: Vec::new(),
        }
    }

    /// Parses a `<list/>` element, the rules come out sorted by order.
    pub fn from_element(list: &Element) -> Result<Self, ExtensionError> {
        let name = list
            .attribute("name")
            .ok_or(ExtensionError::BadResponse(description::BAD_PRIVACY_LIST))?;
        let mut rules = list
            .tags()
            .filter(|tag| tag.name() == "item")
            .map(PrivacyRule::from_element)
            .collect::<Result<Vec<_>, _>>()?;
        rules.sort_by_key(|rule| rule.order);
        Ok(PrivacyList {
            name: name.to_string(),
            rules,
        })
    }

    pub fn to_element(&self) -> Element {
        let mut list = Element::new("list").with_attribute("name", self.name.as_str());
        for rule in &self.rules {
            list.push_child(rule.to_element());
        }
        list
    }
}

/// Names of the lists stored on the server.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PrivacyLists {
    pub active: Option<String>,
    pub default: Option<String>,
    pub names: Vec<String>,
}

/// Acknowledges list change pushes from the server.
pub struct Privacy;

#[async_trait]
impl Extension for Privacy {
    fn name(&self) -> &'static str {
        "privacy"
    }

    async fn handle_iq(&self, session: &Session, iq: &Iq) -> bool {
        let is_push = iq.kind() == IqType::Set
            && iq
                .payload()
                .is_some_and(|payload| payload.is("query", PRIVACY_NS));
        if !is_push || !is_from_server(session, iq) {
            return false;
        }
        let list = iq
            .payload()
            .and_then(|query| query.find_tag("list"))
            .and_then(|list| list.attribute("name"));
        debug!(list, "privacy list changed");
        if let Err(err) = session.send(iq.result_reply(None)).await {
            debug!(%err, "cannot acknowledge privacy list push");
        }
        true
    }
}

fn query() -> Element {
    Element::with_namespace("query", PRIVACY_NS)
}

async fn get_query(session: &Session, payload: Element) -> Result<Element, ExtensionError> {
    let response = session.request(Iq::get(None, payload)).await?;
    response
        .payload()
        .filter(|query| query.is("query", PRIVACY_NS))
        .cloned()
        .ok_or(ExtensionError::BadResponse(description::MISSING_QUERY))
}

fn named(element: Option<&Element>) -> Option<String> {
    element
        .and_then(|element| element.attribute("name"))
        .map(str::to_string)
}

pub async fn get_privacy_list_names(session: &Session) -> Result<PrivacyLists, ExtensionError> {
    let query = get_query(session, query()).await?;
    Ok(PrivacyLists {
        active: named(query.find_tag("active")),
        default: named(query.find_tag("default")),
        names: query
            .tags()
            .filter(|tag| tag.name() == "list")
            .filter_map(|list| list.attribute("name"))
            .map(str::to_string)
            .collect(),
    })
}

pub async fn get_privacy_list(session: &Session, name: &str) -> Result<PrivacyList, ExtensionError> {
    let request = query().with_child(Element::new("list").with_attribute("name", name));
    let query = get_query(session, request).await?;
    let list = query
        .find_tag("list")
        .ok_or(ExtensionError::BadResponse(description::BAD_PRIVACY_LIST))?;
    PrivacyList::from_element(list)
}

/// Fetches every list stored on the server.
pub async fn get_privacy_lists(session: &Session) -> Result<Vec<PrivacyList>, ExtensionError> {
    let names = get_privacy_list_names(session).await?.names;
    let mut lists = Vec::with_capacity(names.len());
    for name in &names {
        lists.push(get_privacy_list(session, name).await?);
    }
    Ok(lists)
}

/// Creates a list or replaces its rules.
pub async fn edit_privacy_list(session: &Session, list: &PrivacyList) -> Result<(), ExtensionError> {
    session
        .request(Iq::set(None, query().with_child(list.to_element())))
        .await?;
    Ok(())
}

pub async fn remove_privacy_list(session: &Session, name: &str) -> Result<(), ExtensionError> {
    let list = Element::new("list").with_attribute("name", name);
    session.request(Iq::set(None, query().with_child(list))).await?;
    Ok(())
}

/// Name of the list active for this session.
pub async fn get_active_privacy_list(session: &Session) -> Result<Option<String>, ExtensionError> {
    Ok(get_privacy_list_names(session).await?.active)
}

/// Name of the list applying to sessions without an active list.
pub async fn get_default_privacy_list(session: &Session) -> Result<Option<String>, ExtensionError> {
    Ok(get_privacy_list_names(session).await?.default)
}

async fn set_named(session: &Session, kind: &str, name: Option<&str>) -> Result<(), ExtensionError> {
    let mut selection = Element::new(kind);
    if let Some(name) = name {
        selection = selection.with_attribute("name", name);
    }
    session
        .request(Iq::set(None, query().with_child(selection)))
        .await?;
    Ok(())
}

/// Makes a list active for this session, `None` declines any active list.
pub async fn set_active_privacy_list(
    session: &Session,
    name: Option<&str>,
) -> Result<(), ExtensionError> {
    set_named(session, "active", name).await
}

/// Sets the list applying to sessions without an active list, `None`
/// declines the default list.
pub async fn set_default_privacy_list(
    session: &Session,
    name: Option<&str>,
) -> Result<(), ExtensionError> {
    set_named(session, "default", name).await
}
