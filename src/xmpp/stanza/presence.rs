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
    /// Presence type; `Available` is the absence of the type attribute.
    PresenceType {
        Available => "available",
        Error => "error",
        Probe => "probe",
        Subscribe => "subscribe",
        Subscribed => "subscribed",
        Unavailable => "unavailable",
        Unsubscribe => "unsubscribe",
        Unsubscribed => "unsubscribed",
    }
}

string_enum! {
    /// Availability sub-state of an available presence.
    Show {
        Away => "away",
        Chat => "chat",
        Dnd => "dnd",
        Xa => "xa",
    }
}

/// A `<presence/>` stanza.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Presence(pub(super) Element);

impl Presence {
    pub fn new(to: Option<&Jid>, kind: PresenceType) -> Self {
        let mut presence = Presence(Element::new(Presence::TAG));
        presence.set_to(to);
        presence.set_kind(kind);
        presence
    }

    pub fn kind(&self) -> PresenceType {
        self.0
            .attribute("type")
            .and_then(|kind| kind.parse().ok())
            .unwrap_or(PresenceType::Available)
    }

    pub fn set_kind(&mut self, kind: PresenceType) {
        let value = match kind {
            PresenceType::Available => None,
            kind => Some(kind.as_str().to_string()),
        };
        self.0.set_attribute("type", value);
    }

    /// Availability sub-state, `None` means plain online.
    pub fn show(&self) -> Option<Show> {
        self.0
            .child_text("show")
            .and_then(|show| show.trim().parse().ok())
    }

    pub fn set_show(&mut self, show: Option<Show>) {
        set_default_text(&mut self.0, "show", show.map(|show| show.as_str()));
    }

    /// Resource priority, 0 when absent or unparseable.
    pub fn priority(&self) -> i8 {
        self.0
            .child_text("priority")
            .and_then(|priority| priority.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn set_priority(&mut self, priority: i8) {
        let value = (priority != 0).then(|| priority.to_string());
        set_default_text(&mut self.0, "priority", value.as_deref());
    }

    pub fn status(&self) -> Option<String> {
        default_text(&self.0, "status")
    }

    pub fn set_status(&mut self, status: Option<&str>) {
        set_default_text(&mut self.0, "status", status);
    }

    /// Status texts in other languages, keyed by language tag.
    pub fn alternate_statuses(&self) -> BTreeMap<String, String> {
        alternate_texts(&self.0, "status")
    }

    pub fn set_alternate_status(&mut self, lang: &str, status: &str) {
        set_alternate_text(&mut self.0, "status", lang, status);
    }

    /// Appends an extension payload.
    pub fn add_payload(&mut self, payload: Element) {
        self.0.push_child(payload);
    }
}

impl TryFrom<Element> for Presence {
    type Error = StanzaError;

    fn try_from(element: Element) -> Result<Self, Self::Error> {
        Presence::check_root(&element)?;
        if let Some(kind) = element.attribute("type") {
            kind.parse::<PresenceType>()?;
        }
        Ok(Presence(element))
    }
}
