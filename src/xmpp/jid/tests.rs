/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::collections::HashSet;

use super::error::description;
use super::*;

fn check_jid(
    jid: Jid,
    full: &str,
    bare: &str,
    local: Option<&str>,
    domain: &str,
    resource: Option<&str>,
) {
    assert_eq!(jid.full(), full);
    assert_eq!(jid.to_string(), full);
    assert_eq!(jid.bare_str(), bare);
    assert_eq!(jid.bare().full(), bare);
    assert_eq!(jid.bare().resourcepart(), None);
    assert_eq!(jid.localpart(), local);
    assert_eq!(jid.domainpart(), domain);
    assert_eq!(jid.resourcepart(), resource);
    assert_eq!(jid.is_bare(), resource.is_none());
}

#[test]
fn good_jids() {
    check_jid(
        Jid::parse("juliet@example.com").unwrap(),
        "juliet@example.com",
        "juliet@example.com",
        Some("juliet"),
        "example.com",
        None,
    );
    check_jid(
        Jid::parse("juliet@example.com/foo").unwrap(),
        "juliet@example.com/foo",
        "juliet@example.com",
        Some("juliet"),
        "example.com",
        Some("foo"),
    );
    check_jid(
        Jid::parse("example.com").unwrap(),
        "example.com",
        "example.com",
        None,
        "example.com",
        None,
    );
    check_jid(
        Jid::parse("example.com/foobar").unwrap(),
        "example.com/foobar",
        "example.com",
        None,
        "example.com",
        Some("foobar"),
    );
    check_jid(
        Jid::parse("room@muc.example.com/Nick With Spaces").unwrap(),
        "room@muc.example.com/Nick With Spaces",
        "room@muc.example.com",
        Some("room"),
        "muc.example.com",
        Some("Nick With Spaces"),
    );
}

#[test]
fn trailing_dot() {
    check_jid(
        Jid::parse("juliet@example.com./balcony").unwrap(),
        "juliet@example.com/balcony",
        "juliet@example.com",
        Some("juliet"),
        "example.com",
        Some("balcony"),
    );
}

#[test]
fn resource_change() {
    let jid = Jid::parse("juliet@example.com/balcony").unwrap();
    check_jid(
        jid.with_resource("orchard").unwrap(),
        "juliet@example.com/orchard",
        "juliet@example.com",
        Some("juliet"),
        "example.com",
        Some("orchard"),
    );

    let jid = Jid::parse("juliet@example.com").unwrap();
    check_jid(
        jid.with_resource("street").unwrap(),
        "juliet@example.com/street",
        "juliet@example.com",
        Some("juliet"),
        "example.com",
        Some("street"),
    );

    assert_eq!(
        jid.with_resource(""),
        Err(JidError::Malformed(description::RESOURCE_EMPTY))
    );
}

#[test]
fn comparisons() {
    let a = Jid::parse("Juliet@Example.COM/Balcony").unwrap();
    let b = Jid::parse("juliet@example.com/Balcony").unwrap();
    let c = Jid::parse("juliet@example.com/balcony").unwrap();
    assert_eq!(a, b);
    assert_ne!(b, c);
    assert_eq!(a.bare(), c.bare());

    let mut set = HashSet::new();
    set.insert(a.clone());
    assert!(set.contains(&b));
    assert!(!set.contains(&c));

    let mut jids = vec![
        Jid::parse("romeo@example.net").unwrap(),
        Jid::parse("juliet@example.com").unwrap(),
        Jid::parse("example.com").unwrap(),
    ];
    jids.sort();
    assert_eq!(jids[0].full(), "example.com");
    assert_eq!(jids[1].full(), "juliet@example.com");
}

#[test]
fn serde_string_form() {
    #[derive(Serialize, Deserialize)]
    struct Contact {
        jid: Jid,
    }

    let contact: Contact = toml::from_str("jid = 'romeo@example.net/orchard'").unwrap();
    assert_eq!(contact.jid.resourcepart(), Some("orchard"));
    assert_eq!(
        toml::to_string(&contact).unwrap().trim(),
        "jid = \"romeo@example.net/orchard\""
    );
    assert!(toml::from_str::<Contact>("jid = '@example.net'").is_err());
}

#[test]
fn bad_jids() {
    let malformed = |msg| Err(JidError::Malformed(msg));

    assert_eq!(Jid::parse(""), malformed(description::DOMAIN_EMPTY));
    assert_eq!(Jid::parse("/resource"), malformed(description::DOMAIN_EMPTY));
    assert_eq!(
        Jid::parse("local@/resource"),
        malformed(description::DOMAIN_EMPTY)
    );
    assert_eq!(Jid::parse("local@"), malformed(description::DOMAIN_EMPTY));
    assert_eq!(Jid::parse("@example.com"), malformed(description::LOCAL_EMPTY));
    assert_eq!(Jid::parse("example.com/"), malformed(description::RESOURCE_EMPTY));
    assert_eq!(
        Jid::parse("a@b@example.com"),
        malformed(description::DOMAIN_FORBIDDEN_CHAR)
    );
    assert_eq!(
        Jid::parse("exa mple.com"),
        malformed(description::DOMAIN_FORBIDDEN_CHAR)
    );
    assert_eq!(
        Jid::parse("ju:liet@example.com"),
        malformed(description::LOCAL_FORBIDDEN_CHAR)
    );
    assert_eq!(
        Jid::parse("<juliet>@example.com"),
        malformed(description::LOCAL_FORBIDDEN_CHAR)
    );
    assert_eq!(
        Jid::parse("a@b/c@d"),
        malformed(description::RESOURCE_FORBIDDEN_CHAR)
    );
    assert_eq!(
        Jid::parse("a@b/c/d"),
        malformed(description::RESOURCE_FORBIDDEN_CHAR)
    );
    assert_eq!(
        Jid::parse("a@b/c<d"),
        malformed(description::RESOURCE_FORBIDDEN_CHAR)
    );
    assert_eq!(
        Jid::parse("example.com/b@example.net"),
        malformed(description::RESOURCE_FORBIDDEN_CHAR)
    );

    let long = "a".repeat(1024);
    assert_eq!(
        Jid::parse(&format!("{long}@example.com")),
        malformed(description::LOCAL_TOO_LONG)
    );
    assert_eq!(Jid::parse(&long), malformed(description::DOMAIN_TOO_LONG));
    assert_eq!(
        Jid::parse(&format!("example.com/{long}")),
        malformed(description::RESOURCE_TOO_LONG)
    );
}
