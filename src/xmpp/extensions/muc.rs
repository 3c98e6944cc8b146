/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Multi-user chat (XEP-0045), the basic room operations.

use async_trait::async_trait;
use tracing::debug;

use super::disco;
use super::disco::DiscoItem;
use crate::Element;
use crate::xmpp::Event;
use crate::xmpp::Extension;
use crate::xmpp::ExtensionError;
use crate::xmpp::Iq;
use crate::xmpp::Jid;
use crate::xmpp::Message;
use crate::xmpp::Presence;
use crate::xmpp::PresenceType;
use crate::xmpp::Session;
use crate::xmpp::StanzaAttributes;
use crate::xmpp::constants::MUC_ADMIN_NS;
use crate::xmpp::constants::MUC_NS;
use crate::xmpp::constants::MUC_OWNER_NS;
use crate::xmpp::constants::MUC_USER_NS;

/// An invitation to a room, relayed by the room itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoomInvite {
    pub room: Jid,
    /// Who sent the invitation.
    pub from: Option<Jid>,
    pub reason: Option<String>,
    pub password: Option<String>,
}

impl RoomInvite {
    /// Parses a mediated invitation, `None` if the message carries none.
    pub fn from_message(message: &Message) -> Option<RoomInvite> {
        let user = message.element().find_tag_ns("x", MUC_USER_NS)?;
        let invite = user.find_tag("invite")?;
        Some(RoomInvite {
            room: message.from()?.bare(),
            from: invite
                .attribute("from")
                .and_then(|from| Jid::parse(from).ok()),
            reason: invite.child_text("reason"),
            password: user.child_text("password"),
        })
    }
}

/// Room configuration as advertised in the room's disco features.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RoomInfo {
    pub name: Option<String>,
    pub public: bool,
    pub persistent: bool,
    pub password_protected: bool,
    pub members_only: bool,
    pub moderated: bool,
    /// Occupants' real jids are visible to everyone.
    pub non_anonymous: bool,
}

impl RoomInfo {
    /// Builds the room info from a disco#info payload.
    pub fn from_info(info: &Element) -> RoomInfo {
        let name = disco::info_identities(info)
            .into_iter()
            .find(|identity| identity.category == "conference")
            .and_then(|identity| identity.name);
        let mut room = RoomInfo {
            name,
            ..RoomInfo::default()
        };
        for feature in disco::info_features(info) {
            match feature.as_str() {
                "muc_public" => room.public = true,
                "muc_persistent" => room.persistent = true,
                "muc_passwordprotected" => room.password_protected = true,
                "muc_membersonly" => room.members_only = true,
                "muc_moderated" => room.moderated = true,
                "muc_nonanonymous" => room.non_anonymous = true,
                _ => (),
            }
        }
        room
    }
}

/// Discussion history to request when joining.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct History {
    pub max_stanzas: Option<u32>,
    pub seconds: Option<u32>,
}

impl History {
    /// Asks for no history at all.
    pub fn none() -> Self {
        History {
            max_stanzas: Some(0),
            seconds: None,
        }
    }

    fn to_element(self) -> Element {
        let mut history = Element::new("history");
        if let Some(max_stanzas) = self.max_stanzas {
            history.set_attribute("maxstanzas", Some(max_stanzas.to_string()));
        }
        if let Some(seconds) = self.seconds {
            history.set_attribute("seconds", Some(seconds.to_string()));
        }
        history
    }
}

/// Long lived relation of a user to a room.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Affiliation {
    Owner,
    Admin,
    Member,
    None,
    Outcast,
}

impl Affiliation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Affiliation::Owner => "owner",
            Affiliation::Admin => "admin",
            Affiliation::Member => "member",
            Affiliation::None => "none",
            Affiliation::Outcast => "outcast",
        }
    }
}

/// Privileges of an occupant during the visit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Moderator,
    Participant,
    Visitor,
    /// Kicks the occupant out.
    None,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Moderator => "moderator",
            Role::Participant => "participant",
            Role::Visitor => "visitor",
            Role::None => "none",
        }
    }
}

/// Turns room invitations into events.
pub struct Muc;

#[async_trait]
impl Extension for Muc {
    fn name(&self) -> &'static str {
        "muc"
    }

    async fn handle_message(&self, session: &Session, message: &Message) -> bool {
        match RoomInvite::from_message(message) {
            Some(invite) => {
                debug!(room = %invite.room, "room invitation");
                session.emit(Event::RoomInvite(invite));
                true
            }
            None => false,
        }
    }
}

fn with_reason(mut element: Element, reason: Option<&str>) -> Element {
    if let Some(reason) = reason {
        element.push_child(Element::new("reason").with_text(reason));
    }
    element
}

/// Lists the rooms hosted by a chat service.
pub async fn discover_rooms(
    session: &Session,
    service: &Jid,
) -> Result<Vec<DiscoItem>, ExtensionError> {
    disco::get_items(session, service).await
}

pub async fn get_room_info(session: &Session, room: &Jid) -> Result<RoomInfo, ExtensionError> {
    Ok(RoomInfo::from_info(&disco::get_info(session, room).await?))
}

/// Enters a room with the given nickname.
///
/// The room answers with the occupant presences, delivered as events.
pub async fn join_room(
    session: &Session,
    room: &Jid,
    nick: &str,
    password: Option<&str>,
    history: Option<History>,
) -> Result<(), ExtensionError> {
    let occupant = room.bare().with_resource(nick)?;
    let mut muc = Element::with_namespace("x", MUC_NS);
    if let Some(password) = password {
        muc.push_child(Element::new("password").with_text(password));
    }
    if let Some(history) = history {
        muc.push_child(history.to_element());
    }
    let mut presence = Presence::new(Some(&occupant), PresenceType::Available);
    presence.add_payload(muc);
    session.send(presence).await?;
    Ok(())
}

pub async fn leave_room(
    session: &Session,
    room: &Jid,
    nick: &str,
    status: Option<&str>,
) -> Result<(), ExtensionError> {
    let occupant = room.bare().with_resource(nick)?;
    let mut presence = Presence::new(Some(&occupant), PresenceType::Unavailable);
    presence.set_status(status);
    session.send(presence).await?;
    Ok(())
}

async fn admin_request(session: &Session, room: &Jid, item: Element) -> Result<(), ExtensionError> {
    let query = Element::with_namespace("query", MUC_ADMIN_NS).with_child(item);
    session.request(Iq::set(Some(&room.bare()), query)).await?;
    Ok(())
}

/// Changes the affiliation of a user, like banning with [Affiliation::Outcast].
pub async fn set_affiliation(
    session: &Session,
    room: &Jid,
    jid: &Jid,
    affiliation: Affiliation,
    reason: Option<&str>,
) -> Result<(), ExtensionError> {
    let item = Element::new("item")
        .with_attribute("affiliation", affiliation.as_str())
        .with_attribute("jid", jid.bare().to_string());
    admin_request(session, room, with_reason(item, reason)).await
}

/// Changes the role of an occupant, like kicking with [Role::None].
pub async fn set_role(
    session: &Session,
    room: &Jid,
    nick: &str,
    role: Role,
    reason: Option<&str>,
) -> Result<(), ExtensionError> {
    let item = Element::new("item")
        .with_attribute("nick", nick)
        .with_attribute("role", role.as_str());
    admin_request(session, room, with_reason(item, reason)).await
}

/// Destroys a room we own.
pub async fn destroy_room(
    session: &Session,
    room: &Jid,
    reason: Option<&str>,
    alternate: Option<&Jid>,
) -> Result<(), ExtensionError> {
    let mut destroy = Element::new("destroy");
    if let Some(alternate) = alternate {
        destroy.set_attribute("jid", Some(alternate.to_string()));
    }
    let query =
        Element::with_namespace("query", MUC_OWNER_NS).with_child(with_reason(destroy, reason));
    session.request(Iq::set(Some(&room.bare()), query)).await?;
    Ok(())
}
