/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::str::FromStr;

use super::*;
use crate::xmpp::constants::PING_NS;
use crate::xmpp::constants::STANZAS_NS;

fn parse(xml: &str) -> Element {
    Element::from_str(xml).unwrap()
}

#[test]
fn root_validation() {
    assert!(Message::try_from(parse("<message/>")).is_ok());
    assert_eq!(
        Message::try_from(parse("<presence/>")),
        Err(StanzaError::WrongRootElement {
            expected: "message",
            found: "presence".to_string()
        })
    );
    assert!(matches!(
        Stanza::try_from(parse("<iq type='get' id='1'/>")),
        Ok(Stanza::Iq(_))
    ));
    assert!(matches!(
        Stanza::try_from(parse("<presence type='unavailable'/>")),
        Ok(Stanza::Presence(_))
    ));
    assert!(matches!(
        Stanza::try_from(parse("<stream:features/>")),
        Err(StanzaError::WrongRootElement { .. })
    ));
    assert_eq!(
        Stanza::try_from(parse("<message type='shout'/>")),
        Err(StanzaError::BadType("shout".to_string()))
    );
    assert_eq!(
        Iq::try_from(parse("<iq id='1'/>")),
        Err(StanzaError::BadType(String::new()))
    );
    assert_eq!(
        Iq::try_from(parse("<iq type='get'/>")),
        Err(StanzaError::MissingId)
    );
}

#[test]
fn addressing() {
    let romeo = Jid::parse("romeo@example.net/orchard").unwrap();
    let mut message = Message::chat(&romeo, "hello");
    assert_eq!(message.to(), Some(romeo.clone()));
    assert_eq!(message.from(), None);
    message.set_from(Some(&romeo.bare()));
    message.set_id(Some("m1"));
    message.set_lang(Some("en"));
    assert_eq!(message.from().map(|jid| jid.to_string()), Some("romeo@example.net".to_string()));
    assert_eq!(message.id(), Some("m1"));
    assert_eq!(message.lang(), Some("en"));
    message.set_to(None);
    assert_eq!(message.to(), None);
    assert_eq!(message.element().attribute("to"), None);
}

#[test]
fn message_texts() {
    let message = Message::try_from(parse(
        "<message type='chat' xml:lang='en'>\
         <body>Hello</body><body xml:lang='de'>Hallo</body>\
         <body xml:lang='fr'>Bonjour</body><subject>Greeting</subject>\
         <thread>t1</thread></message>",
    ))
    .unwrap();
    assert_eq!(message.kind(), MessageType::Chat);
    assert_eq!(message.body(), Some("Hello".to_string()));
    assert_eq!(message.subject(), Some("Greeting".to_string()));
    assert_eq!(message.thread(), Some("t1".to_string()));
    let alternates = message.alternate_bodies();
    assert_eq!(alternates.len(), 2);
    assert_eq!(alternates["de"], "Hallo");
    assert_eq!(alternates["fr"], "Bonjour");
    assert!(message.alternate_subjects().is_empty());
    assert!(!message.is_empty());
}

#[test]
fn message_edits() {
    let mut message = Message::new(None, MessageType::Normal);
    assert!(message.is_empty());
    assert_eq!(message.element().attribute("type"), None);
    message.set_body(Some("one"));
    message.set_body(Some("two"));
    message.set_alternate_body("de", "zwei");
    message.set_alternate_body("de", "zwei!");
    assert_eq!(
        message.to_string(),
        "<message><body>two</body><body xml:lang=\"de\">zwei!</body></message>"
    );
    message.set_body(None);
    assert_eq!(message.body(), Some("zwei!".to_string()));
    assert_eq!(message.kind(), MessageType::Normal);
}

#[test]
fn presence_fields() {
    let presence = Presence::try_from(parse(
        "<presence><show>dnd</show><priority>-5</priority>\
         <status>Busy</status><status xml:lang='es'>Ocupado</status></presence>",
    ))
    .unwrap();
    assert_eq!(presence.kind(), PresenceType::Available);
    assert_eq!(presence.show(), Some(Show::Dnd));
    assert_eq!(presence.priority(), -5);
    assert_eq!(presence.status(), Some("Busy".to_string()));
    assert_eq!(presence.alternate_statuses()["es"], "Ocupado");

    let mut presence = Presence::new(None, PresenceType::Available);
    presence.set_show(Some(Show::Away));
    presence.set_priority(3);
    presence.set_status(Some("Lunch"));
    assert_eq!(
        presence.to_string(),
        "<presence><show>away</show><priority>3</priority><status>Lunch</status></presence>"
    );
    presence.set_show(None);
    presence.set_priority(0);
    assert_eq!(
        presence.to_string(),
        "<presence><status>Lunch</status></presence>"
    );

    let juliet = Jid::parse("juliet@example.com").unwrap();
    let subscribe = Presence::new(Some(&juliet), PresenceType::Subscribe);
    assert_eq!(
        subscribe.to_string(),
        "<presence to=\"juliet@example.com\" type=\"subscribe\"/>"
    );
}

#[test]
fn iq_replies() {
    let iq = Iq::try_from(parse(
        "<iq type='get' id='p1' from='example.com' to='juliet@example.com/balcony'>\
         <ping xmlns='urn:xmpp:ping'/></iq>",
    ))
    .unwrap();
    assert!(iq.is_request());
    assert_eq!(iq.payload_namespace(), Some(PING_NS));

    let result = iq.result_reply(None);
    assert!(result.is_response());
    assert_eq!(
        result.to_string(),
        "<iq type=\"result\" to=\"example.com\" from=\"juliet@example.com/balcony\" id=\"p1\"/>"
    );

    let error = iq.error_reply(ErrorCondition::FeatureNotImplemented);
    assert_eq!(error.kind(), IqType::Error);
    assert_eq!(error.id(), Some("p1"));
    assert_eq!(error.payload().map(Element::name), Some("ping"));
    let remote = error.remote_error().unwrap();
    assert_eq!(remote.condition, ErrorCondition::FeatureNotImplemented);
    assert_eq!(remote.kind, ErrorType::Cancel);
    assert_eq!(iq.remote_error(), None);
}

#[test]
fn remote_errors() {
    let iq = Iq::try_from(parse(
        "<iq type='error' id='x'><error type='auth'>\
         <forbidden xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>\
         <text xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'>go away</text>\
         </error></iq>",
    ))
    .unwrap();
    let error = iq.remote_error().unwrap();
    assert_eq!(error.kind, ErrorType::Auth);
    assert_eq!(error.condition, ErrorCondition::Forbidden);
    assert_eq!(error.text.as_deref(), Some("go away"));
    assert_eq!(error.to_string(), "forbidden (auth): go away");

    let unknown = RemoteError::from_element(&parse(
        "<error><custom-thing xmlns='urn:example'/></error>",
    ));
    assert_eq!(unknown.condition, ErrorCondition::UndefinedCondition);

    let element = RemoteError::new(ErrorCondition::ItemNotFound).to_element();
    assert_eq!(
        element.find_tag_ns("item-not-found", STANZAS_NS).map(Element::name),
        Some("item-not-found")
    );
    assert_eq!(element.attribute("type"), Some("cancel"));
}
