/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use chrono::TimeZone;
use chrono::Timelike;
use chrono::Utc;

use super::*;
use crate::Element;
use crate::xmpp::Event;
use crate::xmpp::ExtensionError;
use crate::xmpp::IqError;
use crate::xmpp::Jid;
use crate::xmpp::Message;
use crate::xmpp::StanzaAttributes;
use crate::xmpp::Subscription;
use crate::xmpp::constants::CUSTOM_IQ_NS;
use crate::xmpp::constants::MUC_ADMIN_NS;
use crate::xmpp::constants::MUC_OWNER_NS;
use crate::xmpp::error::description;
use crate::xmpp::testing::ScriptedServer;
use crate::xmpp::testing::establish;
use crate::xmpp::testing::test_config;

async fn connected() -> (Session, ScriptedServer) {
    let session = Session::new(&test_config());
    register_defaults(&session, &test_config()).unwrap();
    let server = establish(&session).await;
    (session, server)
}

/// Next event other than a state change.
async fn next_event(events: &mut tokio::sync::mpsc::Receiver<Event>) -> Event {
    loop {
        match events.recv().await.unwrap() {
            Event::StatusChanged(_) => continue,
            event => return event,
        }
    }
}

fn jid(jid: &str) -> Jid {
    Jid::parse(jid).unwrap()
}

#[tokio::test]
async fn answers_disco_info() {
    let (_session, mut server) = connected().await;
    server
        .send(
            "<iq type='get' id='d1' from='romeo@example.net/orchard'>\
             <query xmlns='http://jabber.org/protocol/disco#info'/></iq>",
        )
        .await;
    let reply = server.element().await;
    assert_eq!(reply.attribute("type"), Some("result"));
    assert_eq!(reply.attribute("to"), Some("romeo@example.net/orchard"));
    let query = reply.first_tag().unwrap();
    let identities = disco::info_identities(query);
    assert_eq!(identities.len(), 1);
    assert_eq!(identities[0].category, "client");
    assert_eq!(identities[0].name.as_deref(), Some(env!("CARGO_PKG_NAME")));
    assert_eq!(
        disco::info_features(query),
        [
            DISCO_INFO_NS,
            PING_NS,
            VERSION_NS,
            BLOCKING_NS,
            MUC_NS,
            TIME_NS,
            PRIVACY_NS,
            ATTENTION_NS,
            CHATSTATES_NS
        ]
    );
}

#[tokio::test]
async fn queries_disco() {
    let (session, mut server) = connected().await;
    let service = jid("conference.example.com");

    let server_side = async {
        let request = server.element().await;
        assert_eq!(request.attribute("to"), Some("conference.example.com"));
        server
            .reply(
                &request,
                "<query xmlns='http://jabber.org/protocol/disco#items'>\
                 <item jid='lobby@conference.example.com' name='Lobby'/>\
                 <item jid='conference.example.com' node='stats'/></query>",
            )
            .await;
    };
    let (items, ()) = tokio::join!(muc::discover_rooms(&session, &service), server_side);
    let items = items.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].jid, jid("lobby@conference.example.com"));
    assert_eq!(items[0].name.as_deref(), Some("Lobby"));
    assert_eq!(items[1].node.as_deref(), Some("stats"));

    let server_side = async {
        let request = server.element().await;
        server
            .reply(
                &request,
                "<query xmlns='http://jabber.org/protocol/disco#info'>\
                 <identity category='server' type='im'/>\
                 <feature var='urn:xmpp:ping'/></query>",
            )
            .await;
    };
    let target = jid("example.com");
    let (features, ()) = tokio::join!(
        disco::get_features(&session, &target),
        server_side
    );
    assert_eq!(features.unwrap(), ["urn:xmpp:ping"]);

    let server_side = async {
        let request = server.element().await;
        server.reply(&request, "").await;
    };
    let target = jid("example.com");
    let (identities, ()) = tokio::join!(
        disco::get_identities(&session, &target),
        server_side
    );
    assert!(matches!(identities, Err(ExtensionError::BadResponse(_))));
}

#[tokio::test]
async fn pings() {
    let (session, mut server) = connected().await;

    server
        .send("<iq type='get' id='p1' from='example.com'><ping xmlns='urn:xmpp:ping'/></iq>")
        .await;
    let reply = server.element().await;
    assert_eq!(reply.attribute("type"), Some("result"));
    assert_eq!(reply.attribute("id"), Some("p1"));
    assert!(reply.first_tag().is_none());

    let server_side = async {
        let request = server.element().await;
        assert!(request.find_tag_ns("ping", PING_NS).is_some());
        server.reply(&request, "").await;
    };
    let target = jid("example.com");
    let (rtt, ()) = tokio::join!(ping::ping(&session, &target), server_side);
    assert!(rtt.unwrap() < Duration::from_secs(5));

    let server_side = async {
        let request = server.element().await;
        server
            .send(&format!(
                "<iq type='error' id='{}'><error type='cancel'>\
                 <remote-server-not-found xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>\
                 </error></iq>",
                request.attribute("id").unwrap()
            ))
            .await;
    };
    let target = jid("far.example.org");
    let (rtt, ()) = tokio::join!(ping::ping(&session, &target), server_side);
    assert!(matches!(rtt, Err(ExtensionError::Iq(IqError::Remote(_)))));
}

#[tokio::test]
async fn versions() {
    let (session, mut server) = connected().await;

    server
        .send("<iq type='get' id='v1' from='example.com'><query xmlns='jabber:iq:version'/></iq>")
        .await;
    let reply = server.element().await;
    let query = reply.first_tag().unwrap();
    assert_eq!(query.child_text("name").as_deref(), Some(env!("CARGO_PKG_NAME")));
    assert_eq!(
        query.child_text("version").as_deref(),
        Some(env!("CARGO_PKG_VERSION"))
    );

    let server_side = async {
        let request = server.element().await;
        server
            .reply(
                &request,
                "<query xmlns='jabber:iq:version'><name>Prosody</name>\
                 <version>0.12</version></query>",
            )
            .await;
    };
    let target = jid("example.com");
    let (software, ()) = tokio::join!(
        version::get_version(&session, &target),
        server_side
    );
    assert_eq!(
        software.unwrap(),
        version::SoftwareVersion {
            name: "Prosody".to_string(),
            version: "0.12".to_string(),
            os: None,
        }
    );
}

#[tokio::test]
async fn blocklist() {
    let (session, mut server) = connected().await;

    let server_side = async {
        let request = server.element().await;
        assert!(request.find_tag_ns("blocklist", BLOCKING_NS).is_some());
        server
            .reply(
                &request,
                "<blocklist xmlns='urn:xmpp:blocking'>\
                 <item jid='spam@example.org'/><item jid='spam.example.net'/></blocklist>",
            )
            .await;
    };
    let (list, ()) = tokio::join!(blocking::get_blocklist(&session), server_side);
    assert_eq!(list.unwrap(), [jid("spam@example.org"), jid("spam.example.net")]);

    let server_side = async {
        let request = server.element().await;
        let block = request.find_tag_ns("block", BLOCKING_NS).unwrap();
        assert_eq!(
            block.find_tag("item").and_then(|item| item.attribute("jid")),
            Some("troll@example.org")
        );
        server.reply(&request, "").await;
    };
    let trolls = [jid("troll@example.org")];
    let (blocked, ()) = tokio::join!(
        blocking::block(&session, &trolls),
        server_side
    );
    blocked.unwrap();

    let server_side = async {
        let request = server.element().await;
        let unblock = request.find_tag_ns("unblock", BLOCKING_NS).unwrap();
        assert!(unblock.first_tag().is_none());
        server.reply(&request, "").await;
    };
    let (unblocked, ()) = tokio::join!(blocking::unblock(&session, &[]), server_side);
    unblocked.unwrap();

    server
        .send(
            "<iq type='set' id='push1'><block xmlns='urn:xmpp:blocking'>\
             <item jid='other@example.org'/></block></iq>",
        )
        .await;
    let ack = server.element().await;
    assert_eq!(ack.attribute("type"), Some("result"));
    assert_eq!(ack.attribute("id"), Some("push1"));
}

#[test]
fn room_invites() {
    let message: Element = "<message from='darkcave@chat.example.org' to='hecate@example.net'>\
                            <x xmlns='http://jabber.org/protocol/muc#user'>\
                            <invite from='crone1@example.com/desktop'><reason>Hey!</reason></invite>\
                            <password>cauldronburn</password></x></message>"
        .parse()
        .unwrap();
    let message = Message::try_from(message).unwrap();
    let invite = muc::RoomInvite::from_message(&message).unwrap();
    assert_eq!(invite.room, jid("darkcave@chat.example.org"));
    assert_eq!(invite.from, Some(jid("crone1@example.com/desktop")));
    assert_eq!(invite.reason.as_deref(), Some("Hey!"));
    assert_eq!(invite.password.as_deref(), Some("cauldronburn"));

    let plain = Message::chat(&jid("hecate@example.net"), "hi");
    assert!(muc::RoomInvite::from_message(&plain).is_none());
}

#[test]
fn room_info() {
    let info: Element = "<query xmlns='http://jabber.org/protocol/disco#info'>\
                         <identity category='conference' name='A Dark Cave' type='text'/>\
                         <feature var='http://jabber.org/protocol/muc'/>\
                         <feature var='muc_passwordprotected'/><feature var='muc_hidden'/>\
                         <feature var='muc_temporary'/><feature var='muc_open'/>\
                         <feature var='muc_unmoderated'/><feature var='muc_nonanonymous'/>\
                         </query>"
        .parse()
        .unwrap();
    assert_eq!(
        muc::RoomInfo::from_info(&info),
        muc::RoomInfo {
            name: Some("A Dark Cave".to_string()),
            password_protected: true,
            non_anonymous: true,
            ..muc::RoomInfo::default()
        }
    );
}

#[tokio::test]
async fn room_operations() {
    let (session, mut server) = connected().await;
    let mut events = session.take_events().unwrap();
    let room = jid("coven@chat.example.org");

    muc::join_room(
        &session,
        &room,
        "thirdwitch",
        Some("cauldronburn"),
        Some(muc::History::none()),
    )
    .await
    .unwrap();
    let presence = server.element().await;
    assert_eq!(presence.attribute("to"), Some("coven@chat.example.org/thirdwitch"));
    let x = presence.find_tag_ns("x", MUC_NS).unwrap();
    assert_eq!(x.child_text("password").as_deref(), Some("cauldronburn"));
    assert_eq!(
        x.find_tag("history").and_then(|history| history.attribute("maxstanzas")),
        Some("0")
    );

    let server_side = async {
        let request = server.element().await;
        assert_eq!(request.attribute("to"), Some("coven@chat.example.org"));
        let item = request
            .find_tag_ns("query", MUC_ADMIN_NS)
            .and_then(|query| query.find_tag("item"))
            .unwrap();
        assert_eq!(item.attribute("nick"), Some("pistol"));
        assert_eq!(item.attribute("role"), Some("none"));
        assert_eq!(item.child_text("reason").as_deref(), Some("Avaunt"));
        server.reply(&request, "").await;
    };
    let (kicked, ()) = tokio::join!(
        muc::set_role(&session, &room, "pistol", muc::Role::None, Some("Avaunt")),
        server_side
    );
    kicked.unwrap();

    let server_side = async {
        let request = server.element().await;
        let item = request
            .find_tag_ns("query", MUC_ADMIN_NS)
            .and_then(|query| query.find_tag("item"))
            .unwrap();
        assert_eq!(item.attribute("affiliation"), Some("outcast"));
        assert_eq!(item.attribute("jid"), Some("earlofcambridge@shakespeare.lit"));
        server.reply(&request, "").await;
    };
    let target = jid("earlofcambridge@shakespeare.lit/stabber");
    let (banned, ()) = tokio::join!(
        muc::set_affiliation(
            &session,
            &room,
            &target,
            muc::Affiliation::Outcast,
            None
        ),
        server_side
    );
    banned.unwrap();

    let server_side = async {
        let request = server.element().await;
        let destroy = request
            .find_tag_ns("query", MUC_OWNER_NS)
            .and_then(|query| query.find_tag("destroy"))
            .unwrap();
        assert_eq!(destroy.attribute("jid"), Some("heath@chat.example.org"));
        server.reply(&request, "").await;
    };
    let target = jid("heath@chat.example.org");
    let (destroyed, ()) = tokio::join!(
        muc::destroy_room(
            &session,
            &room,
            Some("Macbeth doth come."),
            Some(&target)
        ),
        server_side
    );
    destroyed.unwrap();

    muc::leave_room(&session, &room, "thirdwitch", Some("bye")).await.unwrap();
    let presence = server.element().await;
    assert_eq!(presence.attribute("type"), Some("unavailable"));

    server
        .send(
            "<message from='darkcave@chat.example.org'>\
             <x xmlns='http://jabber.org/protocol/muc#user'>\
             <invite from='crone1@example.com/desktop'/></x></message>",
        )
        .await;
    let invite = loop {
        match events.recv().await.unwrap() {
            Event::RoomInvite(invite) => break invite,
            Event::StatusChanged(_) => continue,
            event => panic!("unexpected event {event:?}"),
        }
    };
    assert_eq!(invite.room, jid("darkcave@chat.example.org"));
}

#[tokio::test]
async fn entity_time() {
    let (session, mut server) = connected().await;

    server
        .send("<iq type='get' id='t1' from='example.com'><time xmlns='urn:xmpp:time'/></iq>")
        .await;
    let reply = server.element().await;
    assert_eq!(reply.attribute("type"), Some("result"));
    let time = time::EntityTime::from_element(reply.find_tag_ns("time", TIME_NS).unwrap()).unwrap();
    assert!((Utc::now() - time.utc).num_seconds().abs() < 60);

    let server_side = async {
        let request = server.element().await;
        assert!(request.find_tag_ns("time", TIME_NS).is_some());
        server
            .reply(
                &request,
                "<time xmlns='urn:xmpp:time'><tzo>-06:00</tzo>\
                 <utc>2006-12-19T17:58:35Z</utc></time>",
            )
            .await;
    };
    let target = jid("juliet@capulet.com/balcony");
    let (time, ()) = tokio::join!(time::get_time(&session, &target), server_side);
    let time = time.unwrap();
    assert_eq!(time.utc, Utc.with_ymd_and_hms(2006, 12, 19, 17, 58, 35).unwrap());
    assert_eq!(time.offset, FixedOffset::west_opt(6 * 3600).unwrap());
    assert_eq!(time.local().hour(), 11);

    let server_side = async {
        let request = server.element().await;
        server
            .send(&format!(
                "<iq type='error' id='{}'><error type='cancel'>\
                 <service-unavailable xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>\
                 </error></iq>",
                request.attribute("id").unwrap()
            ))
            .await;
    };
    let (time, ()) = tokio::join!(time::get_time(&session, &target), server_side);
    assert_eq!(time, Err(ExtensionError::NotSupported(TIME_NS)));

    let server_side = async {
        let request = server.element().await;
        server
            .reply(
                &request,
                "<time xmlns='urn:xmpp:time'><tzo>+25:00</tzo>\
                 <utc>2006-12-19T17:58:35Z</utc></time>",
            )
            .await;
    };
    let (time, ()) = tokio::join!(time::get_time(&session, &target), server_side);
    assert!(matches!(time, Err(ExtensionError::BadResponse(_))));
}

#[tokio::test]
async fn attention() {
    let (session, mut server) = connected().await;
    let mut events = session.take_events().unwrap();
    let target = jid("juliet@capulet.com/balcony");

    let server_side = async {
        let request = server.element().await;
        assert!(request.find_tag_ns("query", DISCO_INFO_NS).is_some());
        server
            .reply(
                &request,
                "<query xmlns='http://jabber.org/protocol/disco#info'>\
                 <feature var='urn:xmpp:attention:0'/></query>",
            )
            .await;
        server.element().await
    };
    let (buzzed, message) = tokio::join!(
        attention::buzz(&session, &target, Some("Why don't you answer?")),
        server_side
    );
    buzzed.unwrap();
    assert_eq!(message.attribute("type"), Some("headline"));
    assert_eq!(message.attribute("to"), Some("juliet@capulet.com/balcony"));
    assert!(message.find_tag_ns("attention", ATTENTION_NS).is_some());
    assert_eq!(message.child_text("body").as_deref(), Some("Why don't you answer?"));

    let server_side = async {
        let request = server.element().await;
        server
            .reply(
                &request,
                "<query xmlns='http://jabber.org/protocol/disco#info'>\
                 <feature var='urn:xmpp:ping'/></query>",
            )
            .await;
    };
    let (buzzed, ()) = tokio::join!(attention::buzz(&session, &target, None), server_side);
    assert_eq!(buzzed, Err(ExtensionError::NotSupported(ATTENTION_NS)));

    server
        .send(
            "<message from='romeo@montague.net/orchard' type='headline'>\
             <attention xmlns='urn:xmpp:attention:0'/></message>",
        )
        .await;
    match next_event(&mut events).await {
        Event::Attention { from, message } => {
            assert_eq!(from, jid("romeo@montague.net/orchard"));
            assert_eq!(message, None);
        }
        event => panic!("unexpected event {event:?}"),
    }
}

#[tokio::test]
async fn chat_states() {
    let (session, mut server) = connected().await;
    let mut events = session.take_events().unwrap();
    let target = jid("juliet@capulet.com/balcony");

    chatstates::set_chat_state(&session, &target, chatstates::ChatState::Composing)
        .await
        .unwrap();
    let message = server.element().await;
    assert_eq!(message.attribute("type"), Some("chat"));
    assert!(message.find_tag_ns("composing", CHATSTATES_NS).is_some());
    assert!(message.find_tag("body").is_none());

    server
        .send(
            "<message from='juliet@capulet.com/balcony' type='chat'>\
             <paused xmlns='http://jabber.org/protocol/chatstates'/></message>",
        )
        .await;
    match next_event(&mut events).await {
        Event::ChatStateChanged { from, state } => {
            assert_eq!(from, target);
            assert_eq!(state, chatstates::ChatState::Paused);
        }
        event => panic!("unexpected event {event:?}"),
    }

    // Groupchat states are ignored, the body still reaches the application.
    server
        .send(
            "<message from='coven@chat.example.org/firstwitch' type='groupchat'>\
             <body>Thrice</body><active xmlns='http://jabber.org/protocol/chatstates'/></message>",
        )
        .await;
    assert!(matches!(next_event(&mut events).await, Event::Message(_)));

    server
        .send(
            "<message from='juliet@capulet.com/balcony' type='chat'><body>Art thou?</body>\
             <active xmlns='http://jabber.org/protocol/chatstates'/></message>",
        )
        .await;
    match next_event(&mut events).await {
        Event::ChatStateChanged { from, state } => {
            assert_eq!(from, target);
            assert_eq!(state, chatstates::ChatState::Active);
        }
        event => panic!("unexpected event {event:?}"),
    }
    match next_event(&mut events).await {
        Event::Message(message) => assert_eq!(message.body().as_deref(), Some("Art thou?")),
        event => panic!("unexpected event {event:?}"),
    }
}

#[tokio::test]
async fn custom_requests() {
    let session = Session::new(&test_config());
    register_defaults(&session, &test_config()).unwrap();
    let handler = Arc::new(custom::CustomIq::new());
    session.register(handler.clone(), &[CUSTOM_IQ_NS]).unwrap();
    let mut server = establish(&session).await;

    let request = "<iq type='get' id='c1' from='romeo@montague.net/orchard'>\
                   <query xmlns='urn:iksjab:customiq'>status?</query></iq>";
    server.send(request).await;
    let reply = server.element().await;
    assert_eq!(reply.attribute("type"), Some("error"));
    assert!(
        reply
            .find_tag("error")
            .and_then(|error| error.find_tag("feature-not-implemented"))
            .is_some()
    );

    handler.set_handler(Some(Arc::new(|from: &Jid, text: &str| {
        Some(format!("{text} {}", from.bare()))
    })));
    server.send(request).await;
    let reply = server.element().await;
    assert_eq!(reply.attribute("type"), Some("result"));
    assert_eq!(
        reply.find_tag_ns("query", CUSTOM_IQ_NS).map(Element::text).as_deref(),
        Some("status? romeo@montague.net")
    );

    let server_side = async {
        let request = server.element().await;
        let query = request.find_tag_ns("query", CUSTOM_IQ_NS).unwrap();
        assert_eq!(query.text(), "ping me");
        server
            .reply(&request, "<query xmlns='urn:iksjab:customiq'>pong</query>")
            .await;
    };
    let target = jid("romeo@montague.net/orchard");
    let (answer, ()) = tokio::join!(
        custom::request_custom_iq(&session, &target, "ping me"),
        server_side
    );
    assert_eq!(answer.unwrap().as_deref(), Some("pong"));

    let server_side = async {
        let request = server.element().await;
        server.reply(&request, "").await;
    };
    let (answer, ()) = tokio::join!(
        custom::request_custom_iq(&session, &target, "quiet"),
        server_side
    );
    assert_eq!(answer.unwrap(), None);
}

#[test]
fn privacy_list_elements() {
    let list: Element = "<list name='public'>\
                         <item action='allow' order='3'/>\
                         <item type='jid' value='tybalt@example.com' action='deny' order='1'/>\
                         <item type='subscription' value='both' action='allow' order='2'>\
                         <message/><presence-in/></item></list>"
        .parse()
        .unwrap();
    let list = privacy::PrivacyList::from_element(&list).unwrap();
    assert_eq!(list.name, "public");
    assert_eq!(
        list.rules,
        [
            privacy::PrivacyRule {
                target: privacy::RuleTarget::Jid(jid("tybalt@example.com")),
                allow: false,
                order: 1,
                stanzas: Vec::new(),
            },
            privacy::PrivacyRule {
                target: privacy::RuleTarget::Subscription(Subscription::Both),
                allow: true,
                order: 2,
                stanzas: vec![
                    privacy::PrivacyStanza::Message,
                    privacy::PrivacyStanza::PresenceIn
                ],
            },
            privacy::PrivacyRule {
                target: privacy::RuleTarget::All,
                allow: true,
                order: 3,
                stanzas: Vec::new(),
            },
        ]
    );
    let element = list.to_element();
    assert_eq!(privacy::PrivacyList::from_element(&element).unwrap(), list);

    for bad in [
        "<list name='x'><item action='maybe' order='1'/></list>",
        "<list name='x'><item action='deny'/></list>",
        "<list name='x'><item type='subscription' value='remove' action='deny' order='1'/></list>",
        "<list name='x'><item type='group' action='deny' order='1'/></list>",
    ] {
        let bad: Element = bad.parse().unwrap();
        assert_eq!(
            privacy::PrivacyList::from_element(&bad),
            Err(ExtensionError::BadResponse(description::BAD_PRIVACY_RULE)),
            "{bad:?}"
        );
    }
}

#[tokio::test]
async fn privacy_lists() {
    let (session, mut server) = connected().await;

    let server_side = async {
        let request = server.element().await;
        assert_eq!(request.attribute("type"), Some("get"));
        let query = request.find_tag_ns("query", PRIVACY_NS).unwrap();
        assert!(query.first_tag().is_none());
        server
            .reply(
                &request,
                "<query xmlns='jabber:iq:privacy'><active name='private'/>\
                 <default name='public'/><list name='public'/><list name='private'/></query>",
            )
            .await;
    };
    let (names, ()) = tokio::join!(privacy::get_privacy_list_names(&session), server_side);
    assert_eq!(
        names.unwrap(),
        privacy::PrivacyLists {
            active: Some("private".to_string()),
            default: Some("public".to_string()),
            names: vec!["public".to_string(), "private".to_string()],
        }
    );

    let server_side = async {
        let request = server.element().await;
        let list = request
            .find_tag_ns("query", PRIVACY_NS)
            .and_then(|query| query.find_tag("list"))
            .unwrap();
        assert_eq!(list.attribute("name"), Some("public"));
        server
            .reply(
                &request,
                "<query xmlns='jabber:iq:privacy'><list name='public'>\
                 <item type='group' value='Enemies' action='deny' order='5'/></list></query>",
            )
            .await;
    };
    let (public, ()) = tokio::join!(privacy::get_privacy_list(&session, "public"), server_side);
    let public = public.unwrap();
    assert_eq!(public.name, "public");
    assert_eq!(
        public.rules[0].target,
        privacy::RuleTarget::Group("Enemies".to_string())
    );

    let server_side = async {
        let request = server.element().await;
        server
            .reply(&request, "<query xmlns='jabber:iq:privacy'><list name='public'/></query>")
            .await;
    };
    let (active, ()) = tokio::join!(privacy::get_active_privacy_list(&session), server_side);
    assert_eq!(active.unwrap(), None);

    let mut list = privacy::PrivacyList::new("quiet");
    list.rules.push(privacy::PrivacyRule {
        target: privacy::RuleTarget::All,
        allow: false,
        order: 1,
        stanzas: vec![privacy::PrivacyStanza::PresenceOut],
    });
    let server_side = async {
        let request = server.element().await;
        assert_eq!(request.attribute("type"), Some("set"));
        let item = request
            .find_tag_ns("query", PRIVACY_NS)
            .and_then(|query| query.find_tag("list"))
            .and_then(|list| list.find_tag("item"))
            .unwrap();
        assert_eq!(item.attribute("action"), Some("deny"));
        assert!(item.find_tag("presence-out").is_some());
        server.reply(&request, "").await;
    };
    let (edited, ()) = tokio::join!(privacy::edit_privacy_list(&session, &list), server_side);
    edited.unwrap();

    let server_side = async {
        let request = server.element().await;
        let active = request
            .find_tag_ns("query", PRIVACY_NS)
            .and_then(|query| query.find_tag("active"))
            .unwrap();
        assert_eq!(active.attribute("name"), Some("quiet"));
        server.reply(&request, "").await;
    };
    let (activated, ()) = tokio::join!(
        privacy::set_active_privacy_list(&session, Some("quiet")),
        server_side
    );
    activated.unwrap();

    let server_side = async {
        let request = server.element().await;
        let default = request
            .find_tag_ns("query", PRIVACY_NS)
            .and_then(|query| query.find_tag("default"))
            .unwrap();
        assert_eq!(default.attribute("name"), None);
        server.reply(&request, "").await;
    };
    let (declined, ()) = tokio::join!(
        privacy::set_default_privacy_list(&session, None),
        server_side
    );
    declined.unwrap();

    let server_side = async {
        let request = server.element().await;
        let list = request
            .find_tag_ns("query", PRIVACY_NS)
            .and_then(|query| query.find_tag("list"))
            .unwrap();
        assert_eq!(list.attribute("name"), Some("quiet"));
        assert!(list.first_tag().is_none());
        server.reply(&request, "").await;
    };
    let (removed, ()) = tokio::join!(privacy::remove_privacy_list(&session, "quiet"), server_side);
    removed.unwrap();

    server
        .send(
            "<iq type='set' id='push2'><query xmlns='jabber:iq:privacy'>\
             <list name='public'/></query></iq>",
        )
        .await;
    let ack = server.element().await;
    assert_eq!(ack.attribute("type"), Some("result"));
    assert_eq!(ack.attribute("id"), Some("push2"));
}
