/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::fmt::Display;
use std::str::FromStr;

use crate::Element;
use crate::xmpp::Jid;
use crate::xmpp::constants::ROSTER_NS;

/// Presence subscription state of a roster item.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Subscription {
    #[default]
    None,
    To,
    From,
    Both,
    /// Only seen in roster pushes, the item was deleted.
    Remove,
}

impl Subscription {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subscription::None => "none",
            Subscription::To => "to",
            Subscription::From => "from",
            Subscription::Both => "both",
            Subscription::Remove => "remove",
        }
    }
}

impl FromStr for Subscription {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Subscription::None),
            "to" => Ok(Subscription::To),
            "from" => Ok(Subscription::From),
            "both" => Ok(Subscription::Both),
            "remove" => Ok(Subscription::Remove),
            _ => Err(()),
        }
    }
}

impl Display for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contact in the roster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RosterItem {
    pub jid: Jid,
    pub name: Option<String>,
    pub groups: Vec<String>,
    pub subscription: Subscription,
    /// A subscription request to the contact is waiting for approval.
    pub pending: bool,
}

impl RosterItem {
    pub fn new(jid: Jid) -> Self {
        RosterItem {
            jid,
            name: None,
            groups: Vec::new(),
            subscription: Subscription::None,
            pending: false,
        }
    }

    /// Parses an `<item/>`, `None` if its jid is missing or malformed.
    pub fn from_element(item: &Element) -> Option<RosterItem> {
        let jid = Jid::parse(item.attribute("jid")?).ok()?;
        Some(RosterItem {
            jid,
            name: item
                .attribute("name")
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            groups: item
                .tags()
                .filter(|tag| tag.name() == "group")
                .map(Element::text)
                .filter(|group| !group.is_empty())
                .collect(),
            // Unknown values are treated as none, as RFC 6121 2.1.2.5 advises
            subscription: item
                .attribute("subscription")
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
            pending: item.attribute("ask") == Some("subscribe"),
        })
    }

    /// The `<item/>` for a roster set.
    ///
    /// Subscription state belongs to the server and is only sent for
    /// removals.
    pub fn to_element(&self) -> Element {
        let mut item = Element::new("item").with_attribute("jid", self.jid.to_string());
        if let Some(name) = &self.name {
            item.set_attribute("name", Some(name.clone()));
        }
        if self.subscription == Subscription::Remove {
            item.set_attribute("subscription", Some(Subscription::Remove.to_string()));
        }
        for group in &self.groups {
            item.push_child(Element::new("group").with_text(group));
        }
        item
    }
}

/// The contact list, in the order the server sent it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Roster {
    items: Vec<RosterItem>,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    /// Parses the items of a roster `<query/>`.
    pub fn from_query(query: &Element) -> Roster {
        let mut roster = Roster::new();
        for item in roster_items(query) {
            roster.apply(item);
        }
        roster
    }

    pub fn items(&self) -> &[RosterItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RosterItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks an item up by the bare form of the jid.
    pub fn get(&self, jid: &Jid) -> Option<&RosterItem> {
        let bare = jid.bare();
        self.items.iter().find(|item| item.jid.bare() == bare)
    }

    /// Adds, updates or removes an item.
    pub fn apply(&mut self, item: RosterItem) {
        let bare = item.jid.bare();
        let pos = self.items.iter().position(|old| old.jid.bare() == bare);
        match (pos, item.subscription) {
            (Some(pos), Subscription::Remove) => {
                self.items.remove(pos);
            }
            (None, Subscription::Remove) => (),
            (Some(pos), _) => self.items[pos] = item,
            (None, _) => self.items.push(item),
        }
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a RosterItem;
    type IntoIter = std::slice::Iter<'a, RosterItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Items of a roster query or push, skipping malformed ones.
pub(crate) fn roster_items(query: &Element) -> impl Iterator<Item = RosterItem> + '_ {
    query
        .tags()
        .filter(|tag| tag.name() == "item")
        .filter_map(RosterItem::from_element)
}

pub(crate) fn roster_query() -> Element {
    Element::with_namespace("query", ROSTER_NS)
}
