/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod error;

use std::cmp::Ordering;
use std::fmt::Display;
use std::hash::Hash;
use std::hash::Hasher;
use std::num::NonZero;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

pub use error::JidError;
use error::description;

const MAX_PART_SIZE: usize = 1023;

fn is_forbidden_in_local(c: char) -> bool {
    matches!(c, '"' | '&' | '\'' | '/' | ':' | '<' | '>' | '@') || c.is_whitespace()
}

fn is_forbidden_in_resource(c: char) -> bool {
    matches!(c, '"' | '&' | '\'' | '/' | ':' | '<' | '>' | '@')
}

fn is_forbidden_in_domain(c: char) -> bool {
    matches!(c, '"' | '&' | '\'' | '/' | '<' | '>' | '@') || c.is_whitespace()
}

struct JidParts<'a> {
    local: Option<&'a str>,
    domain: &'a str,
    resource: Option<&'a str>,
}

impl<'a> JidParts<'a> {
    fn new(jid: &'a str) -> Result<JidParts<'a>, JidError> {
        let (bare, resource) = match jid.split_once('/') {
            Some((bare, resource)) => (bare, Some(resource)),
            None => (jid, None),
        };
        let (local, mut domain) = match bare.split_once('@') {
            Some((local, domain)) => (Some(local), domain),
            None => (None, bare),
        };
        if domain.ends_with('.') {
            // Remove final dot as per RFC 7622 section 3.2
            domain = &domain[..domain.len() - 1];
        }
        check_domain(domain)?;
        if let Some(local) = local {
            check_local(local)?;
        }
        if let Some(resource) = resource {
            check_resource(resource)?;
        }

        Ok(JidParts {
            local,
            domain,
            resource,
        })
    }
}

fn check_domain(domain: &str) -> Result<(), JidError> {
    if domain.is_empty() {
        return Err(JidError::Malformed(description::DOMAIN_EMPTY));
    }
    if domain.len() > MAX_PART_SIZE {
        return Err(JidError::Malformed(description::DOMAIN_TOO_LONG));
    }
    if domain.chars().any(is_forbidden_in_domain) {
        return Err(JidError::Malformed(description::DOMAIN_FORBIDDEN_CHAR));
    }
    Ok(())
}

fn check_local(local: &str) -> Result<(), JidError> {
    if local.is_empty() {
        return Err(JidError::Malformed(description::LOCAL_EMPTY));
    }
    if local.len() > MAX_PART_SIZE {
        return Err(JidError::Malformed(description::LOCAL_TOO_LONG));
    }
    if local.chars().any(is_forbidden_in_local) {
        return Err(JidError::Malformed(description::LOCAL_FORBIDDEN_CHAR));
    }
    Ok(())
}

fn check_resource(resource: &str) -> Result<(), JidError> {
    if resource.is_empty() {
        return Err(JidError::Malformed(description::RESOURCE_EMPTY));
    }
    if resource.len() > MAX_PART_SIZE {
        return Err(JidError::Malformed(description::RESOURCE_TOO_LONG));
    }
    if resource.chars().any(is_forbidden_in_resource) {
        return Err(JidError::Malformed(description::RESOURCE_FORBIDDEN_CHAR));
    }
    Ok(())
}

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

/// The address of an entity in the XMPP protocol.
///
/// Each JID has three parts:
/// - Local part: Optionally identifies a local entity on the domain.
/// - Domain part: Identifies an XMPP server.
/// - Resource part: Optionally identifies a service or an object.
///
/// Local and domain parts are compared case insensitively, the resource
/// part is compared exactly.
///
/// More details can be found in [RFC7622](https://datatracker.ietf.org/doc/rfc7622/)
///
/// ```
/// use iksjab::Jid;
///
/// let jid = Jid::parse("Juliet@Example.com/balcony").unwrap();
/// assert_eq!(jid.bare(), Jid::parse("juliet@example.com").unwrap());
/// assert_eq!(jid.resourcepart(), Some("balcony"));
/// ```
#[derive(Debug, Clone)]
pub struct Jid {
    full: String,
    slash_pos: Option<NonZero<u16>>,
    at_pos: Option<NonZero<u16>>,
}

impl Jid {
    /// Parses a JID from its string form.
    pub fn parse(jid: &str) -> Result<Self, JidError> {
        let parts = JidParts::new(jid)?;

        let mut full = String::with_capacity(jid.len());
        let mut slash_pos = None;
        let mut at_pos = None;
        if let Some(local) = parts.local {
            full.push_str(local);
            at_pos = Some(
                // SAFETY:
                // Invariant: full length cannot be zero.
                // Guard: local part is already pushed and verified to be
                // at least one character long in JidParts.
                unsafe { NonZero::new_unchecked(full.len() as u16) },
            );
            full.push('@');
        }
        full.push_str(parts.domain);
        if let Some(resource) = parts.resource {
            slash_pos = Some(
                // SAFETY:
                // Invariant: full length cannot be zero.
                // Guard: domain part is already pushed and verified to be
                // at least one character long in JidParts.
                unsafe { NonZero::new_unchecked(full.len() as u16) },
            );
            full.push('/');
            full.push_str(resource);
        }

        Ok(Jid {
            full,
            slash_pos,
            at_pos,
        })
    }

    /// Full form of the JID with all the components.
    pub fn full(&self) -> &str {
        &self.full
    }

    /// Bare form of the JID without the resource part.
    pub fn bare(&self) -> Jid {
        Jid {
            full: self.bare_str().to_string(),
            slash_pos: None,
            at_pos: self.at_pos,
        }
    }

    /// String form of the bare JID.
    pub fn bare_str(&self) -> &str {
        match self.slash_pos {
            Some(pos) => &self.full[..pos.get() as usize],
            None => &self.full,
        }
    }

    /// Only the local part of the JID.
    pub fn localpart(&self) -> Option<&str> {
        match self.at_pos {
            Some(pos) => self.full.get(..pos.get() as usize),
            None => None,
        }
    }

    /// Only the domain part of the JID.
    pub fn domainpart(&self) -> &str {
        let start = match self.at_pos {
            Some(pos) => pos.get() as usize + 1,
            None => 0,
        };
        let end = match self.slash_pos {
            Some(pos) => pos.get() as usize,
            None => self.full.len(),
        };
        &self.full[start..end]
    }

    /// Only the resource part of the JID.
    pub fn resourcepart(&self) -> Option<&str> {
        match self.slash_pos {
            Some(pos) => self.full.get(pos.get() as usize + 1..),
            None => None,
        }
    }

    /// True if the JID does not contain a resource part.
    pub fn is_bare(&self) -> bool {
        self.slash_pos.is_none()
    }

    /// Creates another JID by overriding the resource part.
    pub fn with_resource(&self, resource: &str) -> Result<Jid, JidError> {
        check_resource(resource)?;
        let bare = self.bare_str();
        let mut full = String::with_capacity(bare.len() + 1 + resource.len());
        full.push_str(bare);
        let slash_pos = Some(
            // SAFETY:
            // Invariant: slash_pos cannot be null
            // Guard: A valid JID must have a non-empty domain part
            // which will always comes before the slash_pos.
            unsafe { NonZero::new_unchecked(full.len() as u16) },
        );
        full.push('/');
        full.push_str(resource);
        Ok(Jid {
            full,
            slash_pos,
            at_pos: self.at_pos,
        })
    }

    fn compare(&self, other: &Jid) -> Ordering {
        folded(self.localpart().unwrap_or(""))
            .cmp(folded(other.localpart().unwrap_or("")))
            .then_with(|| folded(self.domainpart()).cmp(folded(other.domainpart())))
            .then_with(|| self.resourcepart().cmp(&other.resourcepart()))
    }
}

impl Display for Jid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

impl FromStr for Jid {
    type Err = JidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Jid::parse(s)
    }
}

impl TryFrom<&str> for Jid {
    type Error = JidError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Jid::parse(s)
    }
}

impl PartialEq for Jid {
    fn eq(&self, other: &Jid) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Jid {}

impl PartialOrd for Jid {
    fn partial_cmp(&self, other: &Jid) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Jid {
    fn cmp(&self, other: &Jid) -> Ordering {
        self.compare(other)
    }
}

impl Hash for Jid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in folded(self.localpart().unwrap_or("")) {
            c.hash(state);
        }
        state.write_u8(b'@');
        for c in folded(self.domainpart()) {
            c.hash(state);
        }
        self.resourcepart().hash(state);
    }
}

impl Serialize for Jid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full)
    }
}

impl<'de> Deserialize<'de> for Jid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Jid::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests;
