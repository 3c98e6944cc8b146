/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Chat state notifications (XEP-0085).

use async_trait::async_trait;
use tracing::debug;

use crate::Element;
use crate::xmpp::Event;
use crate::xmpp::Extension;
use crate::xmpp::IqError;
use crate::xmpp::Jid;
use crate::xmpp::Message;
use crate::xmpp::MessageType;
use crate::xmpp::Session;
use crate::xmpp::StanzaAttributes;
use crate::xmpp::constants::CHATSTATES_NS;

/// Participation of a chat partner in the conversation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ChatState {
    Active,
    Composing,
    Paused,
    Inactive,
    Gone,
}

impl ChatState {
    const ALL: [ChatState; 5] = [
        ChatState::Active,
        ChatState::Composing,
        ChatState::Paused,
        ChatState::Inactive,
        ChatState::Gone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatState::Active => "active",
            ChatState::Composing => "composing",
            ChatState::Paused => "paused",
            ChatState::Inactive => "inactive",
            ChatState::Gone => "gone",
        }
    }

    pub fn parse(name: &str) -> Option<ChatState> {
        ChatState::ALL
            .into_iter()
            .find(|state| state.as_str() == name)
    }

    /// The state carried by a message, if any.
    pub fn from_message(message: &Message) -> Option<ChatState> {
        message
            .element()
            .tags()
            .filter(|tag| tag.namespace() == Some(CHATSTATES_NS))
            .find_map(|tag| ChatState::parse(tag.local_name()))
    }

    pub fn to_element(&self) -> Element {
        Element::with_namespace(self.as_str(), CHATSTATES_NS)
    }
}

/// Publishes chat state changes of one to one conversations.
pub struct ChatStates;

#[async_trait]
impl Extension for ChatStates {
    fn name(&self) -> &'static str {
        "chatstates"
    }

    async fn handle_message(&self, session: &Session, message: &Message) -> bool {
        if matches!(message.kind(), MessageType::GroupChat | MessageType::Error) {
            return false;
        }
        let (Some(from), Some(state)) = (message.from(), ChatState::from_message(message)) else {
            return false;
        };
        debug!(%from, state = state.as_str(), "chat state");
        session.emit(Event::ChatStateChanged { from, state });
        // Messages with content still go to the application.
        message.body().is_none()
    }
}

/// Tells a chat partner about our own state.
pub async fn set_chat_state(session: &Session, to: &Jid, state: ChatState) -> Result<(), IqError> {
    let mut message = Message::new(Some(to), MessageType::Chat);
    message.add_payload(state.to_element());
    session.send(message).await
}
