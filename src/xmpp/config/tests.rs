/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::*;

#[test]
fn defaults() {
    let config = ClientConfig::from_toml("jid = 'romeo@montague.lit'").unwrap();
    assert_eq!(config.jid.full(), "romeo@montague.lit");
    assert_eq!(config.password, None);
    assert_eq!(config.host(), "montague.lit");
    assert_eq!(config.port, 5222);
    assert_eq!(config.tls, TlsPolicy::Required);
    assert_eq!(config.connect_timeout(), Duration::from_secs(30));
    assert_eq!(config.default_timeout(), Some(Duration::from_secs(15)));
    assert_eq!(config.outbound_queue, 64);
    assert_eq!(config.event_queue, 256);
    assert_eq!(config.client_name, "iksjab");
}

#[test]
fn full_file() {
    let config = ClientConfig::from_toml(
        r#"
        jid = "juliet@capulet.lit/balcony"
        password = "r0m30"
        server = "xmpp.capulet.lit"
        port = 5223
        tls = "optional"
        resource = "garden"
        connect_timeout_ms = 500
        default_timeout_ms = -1
        outbound_queue = 8
        event_queue = 16
        client_name = "nurse"
        client_version = "2.0"
        "#,
    )
    .unwrap();
    assert_eq!(config.jid.resourcepart(), Some("balcony"));
    assert_eq!(config.password.as_deref(), Some("r0m30"));
    assert_eq!(config.host(), "xmpp.capulet.lit");
    assert_eq!(config.port, 5223);
    assert_eq!(config.tls, TlsPolicy::Optional);
    assert_eq!(config.resource.as_deref(), Some("garden"));
    assert_eq!(config.connect_timeout(), Duration::from_millis(500));
    assert_eq!(config.default_timeout(), None);
    assert_eq!(config.outbound_queue, 8);
    assert_eq!(config.event_queue, 16);
    assert_eq!(config.client_version, "2.0");
}

#[test]
fn bad_files() {
    assert!(matches!(
        ClientConfig::from_toml("jid = 'a@b'\nevent_queue = 0"),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        ClientConfig::from_toml("jid = '@b'"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        ClientConfig::from_toml("jid = 'a@b'\ntls = 'sometimes'"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        ClientConfig::from_toml("jid = 'a@b'\ncolour = 'blue'"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        ClientConfig::load("/nonexistent/iksjab.toml"),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn builder() {
    let config = ClientConfig::builder(Jid::parse("romeo@montague.lit").unwrap())
        .password("secret")
        .server("127.0.0.1")
        .port(15222)
        .tls(TlsPolicy::Disabled)
        .default_timeout(Some(Duration::from_millis(100)))
        .outbound_queue(2)
        .build()
        .unwrap();
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(config.port, 15222);
    assert_eq!(config.default_timeout(), Some(Duration::from_millis(100)));
    assert!(!format!("{config:?}").contains("secret"));

    let round_trip = ClientConfig::from_toml(&toml::to_string(&config).unwrap()).unwrap();
    assert_eq!(round_trip.password.as_deref(), Some("secret"));
    assert_eq!(round_trip.tls, TlsPolicy::Disabled);

    assert!(
        ClientConfig::builder(Jid::parse("romeo@montague.lit").unwrap())
            .outbound_queue(0)
            .build()
            .is_err()
    );
}
