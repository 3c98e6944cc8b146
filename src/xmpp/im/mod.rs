/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Instant messaging: roster, presence subscriptions and messages.
//!
//! Stanzas no extension claims end up here. Anything the application needs
//! to see is published on the session's event channel.

mod roster;
mod status;

use tracing::debug;
use tracing::warn;

use crate::xmpp::ChatState;
use crate::xmpp::ErrorCondition;
use crate::xmpp::Iq;
use crate::xmpp::IqError;
use crate::xmpp::IqType;
use crate::xmpp::Jid;
use crate::xmpp::Message;
use crate::xmpp::MessageType;
use crate::xmpp::Presence;
use crate::xmpp::PresenceType;
use crate::xmpp::RemoteError;
use crate::xmpp::RoomInvite;
use crate::xmpp::Session;
use crate::xmpp::SessionState;
use crate::xmpp::Stanza;
use crate::xmpp::StanzaAttributes;
use crate::xmpp::constants::ROSTER_NS;

pub use roster::Roster;
pub use roster::RosterItem;
pub use roster::Subscription;
pub use status::Status;

use roster::roster_items;
use roster::roster_query;

/// Something the application may want to react to.
#[derive(Clone, Debug)]
pub enum Event {
    StatusChanged(SessionState),
    Message(Message),
    /// Available or unavailable presence of a contact.
    Presence(Presence),
    /// Items changed by a roster push.
    RosterUpdated(Vec<RosterItem>),
    SubscriptionRequest(Jid),
    SubscriptionApproved(Jid),
    SubscriptionRefused(Jid),
    Unsubscribed(Jid),
    RoomInvite(RoomInvite),
    ChatStateChanged {
        from: Jid,
        state: ChatState,
    },
    /// A contact asked for our attention.
    Attention {
        from: Jid,
        message: Option<String>,
    },
    Error {
        from: Option<Jid>,
        error: RemoteError,
    },
    /// The connection is gone, with the failure reason if it did not close
    /// on request.
    Disconnected(Option<String>),
}

/// Fetches the roster and makes it the session's current roster.
pub async fn get_roster(session: &Session) -> Result<Roster, IqError> {
    let response = session.request(Iq::get(None, roster_query())).await?;
    // An empty result means the roster is unchanged (RFC 6121 2.6.3)
    let roster = match response.payload() {
        Some(query) if query.is("query", ROSTER_NS) => Roster::from_query(query),
        _ => session.roster(),
    };
    session.update_roster(|current| *current = roster.clone());
    debug!(items = roster.len(), "roster received");
    Ok(roster)
}

/// Adds or updates a contact.
///
/// The server answers with a roster push which updates the local copy.
pub async fn add_contact(
    session: &Session,
    jid: &Jid,
    name: Option<&str>,
    groups: &[&str],
) -> Result<(), IqError> {
    let mut item = RosterItem::new(jid.bare());
    item.name = name.map(str::to_string);
    item.groups = groups.iter().map(|group| group.to_string()).collect();
    let query = roster_query().with_child(item.to_element());
    session.request(Iq::set(None, query)).await?;
    Ok(())
}

/// Removes a contact, cancelling subscriptions in both directions.
pub async fn remove_contact(session: &Session, jid: &Jid) -> Result<(), IqError> {
    let mut item = RosterItem::new(jid.bare());
    item.subscription = Subscription::Remove;
    let query = roster_query().with_child(item.to_element());
    session.request(Iq::set(None, query)).await?;
    Ok(())
}

pub async fn send_message(session: &Session, message: Message) -> Result<(), IqError> {
    session.send(message).await
}

/// Broadcasts our availability.
pub async fn set_status(session: &Session, status: &Status) -> Result<(), IqError> {
    session.send(status.to_presence()).await
}

async fn send_subscription(
    session: &Session,
    jid: &Jid,
    kind: PresenceType,
) -> Result<(), IqError> {
    session.send(Presence::new(Some(&jid.bare()), kind)).await
}

/// Asks to see the contact's presence.
pub async fn request_subscription(session: &Session, jid: &Jid) -> Result<(), IqError> {
    send_subscription(session, jid, PresenceType::Subscribe).await
}

/// Lets the contact see our presence.
pub async fn approve_subscription_request(session: &Session, jid: &Jid) -> Result<(), IqError> {
    send_subscription(session, jid, PresenceType::Subscribed).await
}

pub async fn refuse_subscription_request(session: &Session, jid: &Jid) -> Result<(), IqError> {
    send_subscription(session, jid, PresenceType::Unsubscribed).await
}

/// Stops seeing the contact's presence.
pub async fn unsubscribe(session: &Session, jid: &Jid) -> Result<(), IqError> {
    send_subscription(session, jid, PresenceType::Unsubscribe).await
}

/// Stops the contact from seeing our presence.
pub async fn revoke_subscription(session: &Session, jid: &Jid) -> Result<(), IqError> {
    send_subscription(session, jid, PresenceType::Unsubscribed).await
}

/// Default handling of stanzas left over by the extensions.
pub(crate) async fn handle_stanza(session: &Session, stanza: &Stanza) -> bool {
    match stanza {
        Stanza::Iq(iq) => handle_iq(session, iq).await,
        Stanza::Presence(presence) => handle_presence(session, presence),
        Stanza::Message(message) => handle_message(session, message),
    }
}

/// True if the IQ comes from our server or our own account.
pub(crate) fn is_from_server(session: &Session, iq: &Iq) -> bool {
    let Some(from) = iq.element().attribute("from") else {
        return true;
    };
    match (Jid::parse(from), session.current_jid()) {
        (Ok(from), Some(own)) => from == own.bare(),
        _ => false,
    }
}

async fn handle_iq(session: &Session, iq: &Iq) -> bool {
    let Some(query) = iq.payload().filter(|query| query.is("query", ROSTER_NS)) else {
        return false;
    };
    if iq.kind() != IqType::Set {
        return false;
    }
    if !is_from_server(session, iq) {
        // RFC 6121 2.1.6, pushes from anyone else are ignored
        warn!(
            from = iq.element().attribute("from"),
            "ignoring roster push from a foreign entity"
        );
        return true;
    }
    let items: Vec<RosterItem> = roster_items(query).collect();
    session.update_roster(|roster| {
        for item in &items {
            roster.apply(item.clone());
        }
    });
    if let Err(err) = session.send(iq.result_reply(None)).await {
        debug!(%err, "cannot acknowledge roster push");
    }
    session.emit(Event::RosterUpdated(items));
    true
}

fn handle_presence(session: &Session, presence: &Presence) -> bool {
    let kind = presence.kind();
    if kind == PresenceType::Error {
        session.emit(Event::Error {
            from: presence.from(),
            error: presence
                .remote_error()
                .unwrap_or_else(|| RemoteError::new(ErrorCondition::UndefinedCondition)),
        });
        return true;
    }
    let Some(from) = presence.from() else {
        debug!(kind = %kind, "dropping presence without sender");
        return false;
    };
    let event = match kind {
        PresenceType::Subscribe => Event::SubscriptionRequest(from),
        PresenceType::Subscribed => Event::SubscriptionApproved(from),
        PresenceType::Unsubscribed => Event::SubscriptionRefused(from),
        PresenceType::Unsubscribe => Event::Unsubscribed(from),
        PresenceType::Available | PresenceType::Unavailable => Event::Presence(presence.clone()),
        PresenceType::Probe | PresenceType::Error => return false,
    };
    session.emit(event);
    true
}

fn handle_message(session: &Session, message: &Message) -> bool {
    if message.kind() == MessageType::Error {
        let error = message
            .remote_error()
            .unwrap_or_else(|| RemoteError::new(ErrorCondition::UndefinedCondition));
        session.emit(Event::Error {
            from: message.from(),
            error,
        });
        return true;
    }
    if message.body().is_none() {
        return false;
    }
    session.emit(Event::Message(message.clone()));
    true
}
