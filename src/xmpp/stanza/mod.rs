/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = StanzaError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => Err(StanzaError::BadType(s.to_string())),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

mod condition;
mod error;
mod iq;
mod message;
mod presence;

use std::fmt::Display;

use crate::Element;
use crate::Node;
use crate::xmpp::Jid;

pub use condition::ErrorCondition;
pub use condition::ErrorType;
pub use condition::RemoteError;
pub use error::StanzaError;
pub use iq::Iq;
pub use iq::IqType;
pub use message::Message;
pub use message::MessageType;
pub use presence::Presence;
pub use presence::PresenceType;
pub use presence::Show;

const XML_LANG: &str = "xml:lang";

/// Addressing attributes shared by all stanza kinds.
///
/// Values are read from and written to the underlying element on each call.
pub trait StanzaAttributes {
    fn element(&self) -> &Element;

    fn element_mut(&mut self) -> &mut Element;

    /// Recipient address, if present and well formed.
    fn to(&self) -> Option<Jid> {
        self.element().attribute("to").and_then(|to| Jid::parse(to).ok())
    }

    fn set_to(&mut self, to: Option<&Jid>) {
        self.element_mut()
            .set_attribute("to", to.map(Jid::to_string));
    }

    /// Sender address, if present and well formed.
    fn from(&self) -> Option<Jid> {
        self.element()
            .attribute("from")
            .and_then(|from| Jid::parse(from).ok())
    }

    fn set_from(&mut self, from: Option<&Jid>) {
        self.element_mut()
            .set_attribute("from", from.map(Jid::to_string));
    }

    fn id(&self) -> Option<&str> {
        self.element().attribute("id")
    }

    fn set_id(&mut self, id: Option<&str>) {
        self.element_mut()
            .set_attribute("id", id.map(str::to_string));
    }

    fn lang(&self) -> Option<&str> {
        self.element().attribute(XML_LANG)
    }

    fn set_lang(&mut self, lang: Option<&str>) {
        self.element_mut()
            .set_attribute(XML_LANG, lang.map(str::to_string));
    }

    /// True if the stanza has no child nodes.
    fn is_empty(&self) -> bool {
        self.element().is_empty()
    }

    /// Error details of a stanza with type `error`.
    fn remote_error(&self) -> Option<RemoteError> {
        if self.element().attribute("type") != Some("error") {
            return None;
        }
        Some(match self.element().find_tag("error") {
            Some(error) => RemoteError::from_element(error),
            None => RemoteError::new(ErrorCondition::UndefinedCondition),
        })
    }
}

macro_rules! stanza_view {
    ($name:ident, $tag:literal) => {
        impl StanzaAttributes for $name {
            fn element(&self) -> &Element {
                &self.0
            }

            fn element_mut(&mut self) -> &mut Element {
                &mut self.0
            }
        }

        impl $name {
            pub const TAG: &'static str = $tag;

            pub fn into_element(self) -> Element {
                self.0
            }

            fn check_root(element: &Element) -> Result<(), StanzaError> {
                if element.name() != $tag {
                    return Err(StanzaError::WrongRootElement {
                        expected: $tag,
                        found: element.name().to_string(),
                    });
                }
                Ok(())
            }
        }

        impl From<$name> for Element {
            fn from(stanza: $name) -> Element {
                stanza.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

stanza_view!(Message, "message");
stanza_view!(Presence, "presence");
stanza_view!(Iq, "iq");

/// Any of the three top level stanza kinds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Stanza {
    Message(Message),
    Presence(Presence),
    Iq(Iq),
}

impl Stanza {
    pub fn element(&self) -> &Element {
        match self {
            Stanza::Message(message) => message.element(),
            Stanza::Presence(presence) => presence.element(),
            Stanza::Iq(iq) => iq.element(),
        }
    }

    pub fn into_element(self) -> Element {
        match self {
            Stanza::Message(message) => message.into_element(),
            Stanza::Presence(presence) => presence.into_element(),
            Stanza::Iq(iq) => iq.into_element(),
        }
    }
}

impl TryFrom<Element> for Stanza {
    type Error = StanzaError;

    fn try_from(element: Element) -> Result<Self, Self::Error> {
        if element.name() == Message::TAG {
            Ok(Stanza::Message(Message::try_from(element)?))
        } else if element.name() == Presence::TAG {
            Ok(Stanza::Presence(Presence::try_from(element)?))
        } else if element.name() == Iq::TAG {
            Ok(Stanza::Iq(Iq::try_from(element)?))
        } else {
            Err(StanzaError::WrongRootElement {
                expected: "message, presence or iq",
                found: element.name().to_string(),
            })
        }
    }
}

impl From<Message> for Stanza {
    fn from(message: Message) -> Self {
        Stanza::Message(message)
    }
}

impl From<Presence> for Stanza {
    fn from(presence: Presence) -> Self {
        Stanza::Presence(presence)
    }
}

impl From<Iq> for Stanza {
    fn from(iq: Iq) -> Self {
        Stanza::Iq(iq)
    }
}

impl Display for Stanza {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self.element(), f)
    }
}

/// Text of the child with the stanza's default language.
///
/// Children without `xml:lang`, or with the same language as the stanza,
/// are preferred; otherwise the first child with that name is used.
fn default_text(element: &Element, name: &str) -> Option<String> {
    let stanza_lang = element.attribute(XML_LANG);
    let mut first = None;
    for tag in element.tags().filter(|tag| tag.name() == name) {
        let lang = tag.attribute(XML_LANG);
        if lang.is_none() || lang == stanza_lang {
            return Some(tag.text());
        }
        first.get_or_insert(tag);
    }
    first.map(Element::text)
}

/// Texts of the named children in languages other than the stanza's own.
fn alternate_texts(element: &Element, name: &str) -> std::collections::BTreeMap<String, String> {
    let stanza_lang = element.attribute(XML_LANG);
    element
        .tags()
        .filter(|tag| tag.name() == name)
        .filter_map(|tag| match tag.attribute(XML_LANG) {
            Some(lang) if Some(lang) != stanza_lang => Some((lang.to_string(), tag.text())),
            _ => None,
        })
        .collect()
}

/// Replaces the default language child with the given text, or removes it.
fn set_default_text(element: &mut Element, name: &str, text: Option<&str>) {
    let stanza_lang = element.attribute(XML_LANG).map(str::to_string);
    let children = element.take_children();
    for child in children {
        match child {
            Node::Element(tag)
                if tag.name() == name
                    && (tag.attribute(XML_LANG).is_none()
                        || tag.attribute(XML_LANG) == stanza_lang.as_deref()) => {}
            Node::Element(tag) => element.push_child(tag),
            Node::Text(cdata) => element.push_text(&cdata),
        }
    }
    if let Some(text) = text {
        element.push_child(Element::new(name).with_text(text));
    }
}

/// Adds or replaces the child for the given language.
fn set_alternate_text(element: &mut Element, name: &str, lang: &str, text: &str) {
    let children = element.take_children();
    for child in children {
        match child {
            Node::Element(tag)
                if tag.name() == name && tag.attribute(XML_LANG) == Some(lang) => {}
            Node::Element(tag) => element.push_child(tag),
            Node::Text(cdata) => element.push_text(&cdata),
        }
    }
    element.push_child(
        Element::new(name)
            .with_attribute(XML_LANG, lang)
            .with_text(text),
    );
}

#[cfg(test)]
mod tests;
