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

use crate::xmpp::Presence;
use crate::xmpp::PresenceType;
use crate::xmpp::Show;

/// Our own availability, as broadcast to contacts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Status {
    pub available: bool,
    pub show: Option<Show>,
    pub message: Option<String>,
    /// Status messages in other languages, keyed by language tag.
    pub alternate_messages: BTreeMap<String, String>,
    pub priority: i8,
}

impl Default for Status {
    fn default() -> Self {
        Status::online()
    }
}

impl Status {
    pub fn online() -> Self {
        Status {
            available: true,
            show: None,
            message: None,
            alternate_messages: BTreeMap::new(),
            priority: 0,
        }
    }

    pub fn away(message: Option<&str>) -> Self {
        Status {
            show: Some(Show::Away),
            message: message.map(str::to_string),
            ..Status::online()
        }
    }

    pub fn offline() -> Self {
        Status {
            available: false,
            ..Status::online()
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Adds the status message for another language.
    pub fn with_alternate_message(mut self, lang: &str, message: &str) -> Self {
        self.alternate_messages
            .insert(lang.to_string(), message.to_string());
        self
    }

    pub fn with_priority(mut self, priority: i8) -> Self {
        self.priority = priority;
        self
    }

    /// Reads the status advertised by a contact's presence.
    pub fn from_presence(presence: &Presence) -> Status {
        Status {
            available: presence.kind() != PresenceType::Unavailable,
            show: presence.show(),
            message: presence.status(),
            alternate_messages: presence.alternate_statuses(),
            priority: presence.priority(),
        }
    }

    /// The broadcast presence announcing this status.
    pub fn to_presence(&self) -> Presence {
        let kind = if self.available {
            PresenceType::Available
        } else {
            PresenceType::Unavailable
        };
        let mut presence = Presence::new(None, kind);
        if self.available {
            presence.set_show(self.show);
            presence.set_priority(self.priority);
        }
        presence.set_status(self.message.as_deref());
        for (lang, message) in &self.alternate_messages {
            presence.set_alternate_status(lang, message);
        }
        presence
    }
}
