/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod document;
mod entities;
mod parser;
pub mod xmpp;

pub use parser::Location;
pub use parser::SaxElement;
pub use parser::SaxError;
pub use parser::SaxHandler;
pub use parser::SaxParser;

pub use document::DocumentError;
pub use document::DocumentParser;
pub use document::Element;
pub use document::ElementBuilder;
pub use document::Node;

pub use entities::escape;
pub use entities::escaped_size;

pub use xmpp::ClientConfig;
pub use xmpp::ConnectError;
pub use xmpp::Event;
pub use xmpp::IqError;
pub use xmpp::Jid;
pub use xmpp::JidError;
pub use xmpp::Roster;
pub use xmpp::Session;
pub use xmpp::SessionState;
pub use xmpp::TlsPolicy;
pub use xmpp::XmppClient;

/// Version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
