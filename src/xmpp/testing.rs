/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! In-memory XMPP server for exercising the client side in tests.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::DuplexStream;

use crate::Element;
use crate::xmpp::BoxedStream;
use crate::xmpp::ClientConfig;
use crate::xmpp::Jid;
use crate::xmpp::Session;
use crate::xmpp::StreamElement;
use crate::xmpp::StreamParser;
use crate::xmpp::TlsPolicy;
use crate::xmpp::TlsUpgrade;
use crate::xmpp::TransportError;
use crate::xmpp::negotiation::Negotiation;

pub(crate) const SERVER_HEADER: &str = "<?xml version='1.0'?>\
    <stream:stream xmlns='jabber:client' xmlns:stream='http://etherx.jabber.org/streams' \
    id='s1' from='example.com' version='1.0'>";

pub(crate) const PLAIN_FEATURES: &str = "<stream:features>\
    <mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'><mechanism>PLAIN</mechanism></mechanisms>\
    </stream:features>";

pub(crate) const BIND_FEATURES: &str = "<stream:features>\
    <bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/>\
    <session xmlns='urn:ietf:params:xml:ns:xmpp-session'><optional/></session>\
    </stream:features>";

/// TLS upgrade which keeps talking over the original stream.
pub(crate) struct PassthroughTls;

#[async_trait]
impl TlsUpgrade for PassthroughTls {
    async fn upgrade(
        &self,
        stream: BoxedStream,
        _domain: &str,
    ) -> Result<BoxedStream, TransportError> {
        Ok(stream)
    }
}

/// Server end of an in-memory connection, driven step by step by a test.
pub(crate) struct ScriptedServer {
    stream: DuplexStream,
    parser: StreamParser,
    pub headers: usize,
}

impl ScriptedServer {
    pub fn new() -> (BoxedStream, ScriptedServer) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let server = ScriptedServer {
            stream: server,
            parser: StreamParser::new(),
            headers: 0,
        };
        (Box::new(client), server)
    }

    /// Next construct sent by the client, `None` once it hangs up.
    pub async fn next(&mut self) -> Option<StreamElement> {
        let mut buf = [0u8; 4096];
        loop {
            if let Some(element) = self.parser.next_element() {
                return Some(element);
            }
            let nr = self.stream.read(&mut buf).await.ok()?;
            if nr == 0 {
                return None;
            }
            self.parser.parse_bytes(&buf[..nr]).unwrap();
        }
    }

    /// Next top level element sent by the client.
    pub async fn element(&mut self) -> Element {
        match self.next().await {
            Some(StreamElement::Element(element)) => element,
            other => panic!("expected an element, got {other:?}"),
        }
    }

    pub async fn send(&mut self, data: &str) {
        self.stream.write_all(data.as_bytes()).await.unwrap();
    }

    /// Waits for a fresh client stream header and answers it.
    pub async fn accept_header(&mut self) {
        self.parser.reset();
        match self.next().await {
            Some(StreamElement::Start(header)) => {
                assert_eq!(header.attribute("to"), Some("example.com"));
                self.headers += 1;
            }
            other => panic!("expected a stream header, got {other:?}"),
        }
        self.send(SERVER_HEADER).await;
    }

    /// Answers an IQ request with a result carrying the given payload.
    pub async fn reply(&mut self, request: &Element, payload: &str) {
        let id = request.attribute("id").unwrap_or_default();
        let reply = if payload.is_empty() {
            format!("<iq type='result' id='{id}'/>")
        } else {
            format!("<iq type='result' id='{id}'>{payload}</iq>")
        };
        self.send(&reply).await;
    }

    /// Plays the server side of a PLAIN login up to the bind request.
    pub async fn login_until_bind(&mut self) -> Element {
        self.accept_header().await;
        self.send(PLAIN_FEATURES).await;
        let auth = self.element().await;
        assert_eq!(auth.attribute("mechanism"), Some("PLAIN"));
        self.send("<success xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>")
            .await;

        self.accept_header().await;
        self.send(BIND_FEATURES).await;
        let bind = self.element().await;
        assert_eq!(bind.attribute("type"), Some("set"));
        bind
    }

    /// Plays the server side of a PLAIN login up to the roster request.
    ///
    /// Returns the roster request so the test can answer it.
    pub async fn login_until_roster(&mut self, resource: &str) -> Element {
        let bind = self.login_until_bind().await;
        let requested = bind
            .first_tag()
            .and_then(|bind| bind.child_text("resource"))
            .unwrap_or_else(|| resource.to_string());
        self.reply(
            &bind,
            &format!(
                "<bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'>\
                 <jid>user@example.com/{requested}</jid></bind>"
            ),
        )
        .await;

        let roster = self.element().await;
        assert_eq!(roster.attribute("type"), Some("get"));
        assert!(
            roster
                .find_tag_ns("query", "jabber:iq:roster")
                .is_some()
        );
        roster
    }

    /// Plays a PLAIN login with a single item roster.
    pub async fn login(&mut self, resource: &str) {
        let roster = self.login_until_roster(resource).await;
        self.reply(
            &roster,
            "<query xmlns='jabber:iq:roster'>\
             <item jid='friend@example.com' name='Friend' subscription='both'>\
             <group>Buddies</group></item></query>",
        )
        .await;
    }
}

pub(crate) fn test_config() -> ClientConfig {
    ClientConfig::builder(Jid::parse("user@example.com").unwrap())
        .password("secret")
        .tls(TlsPolicy::Disabled)
        .resource("test")
        .build()
        .unwrap()
}

/// Negotiation parameters matching [test_config].
pub(crate) fn test_negotiation(jid: &Jid) -> Negotiation<'_> {
    Negotiation {
        jid,
        password: "secret",
        resource: Some("test"),
        tls_policy: TlsPolicy::Disabled,
        tls: &PassthroughTls,
        connect_timeout: Some(Duration::from_secs(5)),
        request_timeout: Some(Duration::from_secs(5)),
    }
}

/// Establishes the session against a scripted server.
///
/// The returned server has answered the roster request and is ready for
/// the test's own script.
pub(crate) async fn establish(session: &Session) -> ScriptedServer {
    let jid = Jid::parse("user@example.com").unwrap();
    let (stream, mut server) = ScriptedServer::new();
    let negotiation = test_negotiation(&jid);
    let (roster, ()) = tokio::join!(
        session.establish(std::future::ready(Ok(stream)), &negotiation),
        server.login("test")
    );
    assert_eq!(roster.unwrap().len(), 1);
    server
}
