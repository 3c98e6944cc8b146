/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

pub const CLIENT_PORT: u16 = 5222;

pub const STREAM_TAG: &str = "stream:stream";

pub const FEATURES_TAG: &str = "stream:features";

pub const ERROR_TAG: &str = "stream:error";

pub const CLIENT_NS: &str = "jabber:client";

pub const STREAM_NS: &str = "http://etherx.jabber.org/streams";

pub const STREAM_ERRORS_NS: &str = "urn:ietf:params:xml:ns:xmpp-streams";

pub const TLS_NS: &str = "urn:ietf:params:xml:ns:xmpp-tls";

pub const SASL_NS: &str = "urn:ietf:params:xml:ns:xmpp-sasl";

pub const BIND_NS: &str = "urn:ietf:params:xml:ns:xmpp-bind";

pub const SESSION_NS: &str = "urn:ietf:params:xml:ns:xmpp-session";

pub const STANZAS_NS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";

pub const ROSTER_NS: &str = "jabber:iq:roster";

pub const DISCO_INFO_NS: &str = "http://jabber.org/protocol/disco#info";

pub const DISCO_ITEMS_NS: &str = "http://jabber.org/protocol/disco#items";

pub const PING_NS: &str = "urn:xmpp:ping";

pub const VERSION_NS: &str = "jabber:iq:version";

pub const BLOCKING_NS: &str = "urn:xmpp:blocking";

pub const TIME_NS: &str = "urn:xmpp:time";

pub const ATTENTION_NS: &str = "urn:xmpp:attention:0";

pub const CHATSTATES_NS: &str = "http://jabber.org/protocol/chatstates";

pub const PRIVACY_NS: &str = "jabber:iq:privacy";

pub const CUSTOM_IQ_NS: &str = "urn:iksjab:customiq";

pub const MUC_NS: &str = "http://jabber.org/protocol/muc";

pub const MUC_USER_NS: &str = "http://jabber.org/protocol/muc#user";

pub const MUC_ADMIN_NS: &str = "http://jabber.org/protocol/muc#admin";

pub const MUC_OWNER_NS: &str = "http://jabber.org/protocol/muc#owner";
