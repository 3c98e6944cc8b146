/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Entity time (XEP-0202).

use async_trait::async_trait;
use chrono::DateTime;
use chrono::FixedOffset;
use chrono::Local;
use chrono::SecondsFormat;
use chrono::Utc;
use tracing::debug;

use super::is_get;
use crate::Element;
use crate::xmpp::ErrorCondition;
use crate::xmpp::Extension;
use crate::xmpp::ExtensionError;
use crate::xmpp::Iq;
use crate::xmpp::IqError;
use crate::xmpp::Jid;
use crate::xmpp::Session;
use crate::xmpp::constants::TIME_NS;
use crate::xmpp::error::description;

/// Current time of an entity, with the offset of its time zone.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EntityTime {
    pub utc: DateTime<Utc>,
    pub offset: FixedOffset,
}

impl EntityTime {
    pub fn now() -> Self {
        EntityTime {
            utc: Utc::now(),
            offset: *Local::now().offset(),
        }
    }

    /// Wall clock time of the entity.
    pub fn local(&self) -> DateTime<FixedOffset> {
        self.utc.with_timezone(&self.offset)
    }

    pub fn to_element(&self) -> Element {
        Element::with_namespace("time", TIME_NS)
            .with_child(Element::new("tzo").with_text(&self.offset.to_string()))
            .with_child(
                Element::new("utc").with_text(&self.utc.to_rfc3339_opts(SecondsFormat::Millis, true)),
            )
    }

    pub fn from_element(time: &Element) -> Option<Self> {
        let offset = parse_offset(time.child_text("tzo")?.trim())?;
        let utc = DateTime::parse_from_rfc3339(time.child_text("utc")?.trim())
            .ok()?
            .with_timezone(&Utc);
        Some(EntityTime { utc, offset })
    }
}

/// Parses a `[+-]hh:mm` or `Z` zone offset.
fn parse_offset(tzo: &str) -> Option<FixedOffset> {
    if tzo == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match tzo.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Answers time queries with the local clock.
pub struct Time;

#[async_trait]
impl Extension for Time {
    fn name(&self) -> &'static str {
        "time"
    }

    async fn handle_iq(&self, session: &Session, iq: &Iq) -> bool {
        if !is_get(iq, "time", TIME_NS) {
            return false;
        }
        let reply = iq.result_reply(Some(EntityTime::now().to_element()));
        if let Err(err) = session.send(reply).await {
            debug!(%err, "cannot answer time query");
        }
        true
    }
}

/// Asks an entity for its current time.
pub async fn get_time(session: &Session, jid: &Jid) -> Result<EntityTime, ExtensionError> {
    let request = Iq::get(Some(jid), Element::with_namespace("time", TIME_NS));
    let response = match session.request(request).await {
        Ok(response) => response,
        Err(IqError::Remote(error))
            if matches!(
                error.condition,
                ErrorCondition::ServiceUnavailable | ErrorCondition::FeatureNotImplemented
            ) =>
        {
            return Err(ExtensionError::NotSupported(TIME_NS));
        }
        Err(err) => return Err(err.into()),
    };
    response
        .payload()
        .filter(|time| time.is("time", TIME_NS))
        .and_then(EntityTime::from_element)
        .ok_or(ExtensionError::BadResponse(description::BAD_TIME))
}
