/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::collections::BTreeMap;

use crate::Element;
use crate::xmpp::Jid;

use super::StanzaAttributes;
use super::StanzaError;
use super::alternate_texts;
use super::default_text;
use super::set_alternate_text;
use super::set_default_text;

string_enum! {
    MessageType {
        Chat => "chat",
        Error => "error",
        GroupChat => "groupchat",
        Headline => "headline",
        Normal => "normal",
    }
}

/// A `<message/>` stanza.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message(pub(super) Element);

impl Message {
    pub fn new(to: Option<&Jid>, kind: MessageType) -> Self {
        let mut message = Message(Element::new(Message::TAG));
        message.set_to(to);
        message.set_kind(kind);
        message
    }

    /// A one-to-one chat message with a body.
    pub fn chat(to: &Jid, body: &str) -> Self {
        let mut message = Message::new(Some(to), MessageType::Chat);
        message.set_body(Some(body));
        message
    }

    /// Message type, `normal` when the attribute is absent.
    pub fn kind(&self) -> MessageType {
        self.0
            .attribute("type")
            .and_then(|kind| kind.parse().ok())
            .unwrap_or(MessageType::Normal)
    }

    pub fn set_kind(&mut self, kind: MessageType) {
        let value = match kind {
            MessageType::Normal => None,
            kind => Some(kind.as_str().to_string()),
        };
        self.0.set_attribute("type", value);
    }

    pub fn body(&self) -> Option<String> {
        default_text(&self.0, "body")
    }

    pub fn set_body(&mut self, body: Option<&str>) {
        set_default_text(&mut self.0, "body", body);
    }

    /// Bodies in other languages, keyed by language tag.
    pub fn alternate_bodies(&self) -> BTreeMap<String, String> {
        alternate_texts(&self.0, "body")
    }

    pub fn set_alternate_body(&mut self, lang: &str, body: &str) {
        set_alternate_text(&mut self.0, "body", lang, body);
    }

    pub fn subject(&self) -> Option<String> {
        default_text(&self.0, "subject")
    }

    pub fn set_subject(&mut self, subject: Option<&str>) {
        set_default_text(&mut self.0, "subject", subject);
    }

    /// Subjects in other languages, keyed by language tag.
    pub fn alternate_subjects(&self) -> BTreeMap<String, String> {
        alternate_texts(&self.0, "subject")
    }

    pub fn set_alternate_subject(&mut self, lang: &str, subject: &str) {
        set_alternate_text(&mut self.0, "subject", lang, subject);
    }

    pub fn thread(&self) -> Option<String> {
        self.0.child_text("thread")
    }

    pub fn set_thread(&mut self, thread: Option<&str>) {
        set_default_text(&mut self.0, "thread", thread);
    }

    /// Appends an extension payload.
    pub fn add_payload(&mut self, payload: Element) {
        self.0.push_child(payload);
    }
}

impl TryFrom<Element> for Message {
    type Error = StanzaError;

    fn try_from(element: Element) -> Result<Self, Self::Error> {
        Message::check_root(&element)?;
        if let Some(kind) = element.attribute("type") {
            kind.parse::<MessageType>()?;
        }
        Ok(Message(element))
    }
}
