/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod client;
mod config;
pub(crate) mod constants;
mod error;
mod extension;
pub mod extensions;
pub mod im;
mod jid;
mod negotiation;
mod sasl;
mod session;
mod stanza;
mod stream;
mod transport;

#[cfg(test)]
mod testing;

pub use client::XmppClient;
pub use config::ClientConfig;
pub use config::ClientConfigBuilder;
pub use config::ConfigError;
pub use config::TlsPolicy;
pub use error::ConnectError;
pub use error::ExtensionError;
pub use error::IqError;
pub use extension::Extension;
pub use extension::ExtensionRegistry;
pub use extensions::chatstates::ChatState;
pub use extensions::muc::RoomInvite;
pub use im::Event;
pub use im::Roster;
pub use im::RosterItem;
pub use im::Status;
pub use im::Subscription;
pub use jid::Jid;
pub use jid::JidError;
pub use negotiation::SessionState;
pub use sasl::SaslError;
pub use session::Session;
pub use stanza::ErrorCondition;
pub use stanza::ErrorType;
pub use stanza::Iq;
pub use stanza::IqType;
pub use stanza::Message;
pub use stanza::MessageType;
pub use stanza::Presence;
pub use stanza::PresenceType;
pub use stanza::RemoteError;
pub use stanza::Show;
pub use stanza::Stanza;
pub use stanza::StanzaAttributes;
pub use stanza::StanzaError;
pub use stream::StreamElement;
pub use stream::StreamError;
pub use stream::StreamParser;
pub use transport::AsyncStream;
pub use transport::BoxedStream;
pub use transport::RustlsUpgrade;
pub use transport::StreamReader;
pub use transport::StreamWriter;
pub use transport::TlsUpgrade;
pub use transport::TransportError;
pub use transport::XmlStream;
pub use transport::connect_tcp;
