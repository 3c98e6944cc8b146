/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Software version (XEP-0092).

use async_trait::async_trait;
use tracing::debug;

use super::is_get;
use crate::Element;
use crate::xmpp::Extension;
use crate::xmpp::ExtensionError;
use crate::xmpp::Iq;
use crate::xmpp::Jid;
use crate::xmpp::Session;
use crate::xmpp::constants::VERSION_NS;
use crate::xmpp::error::description;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SoftwareVersion {
    pub name: String,
    pub version: String,
    pub os: Option<String>,
}

/// Answers version queries with the configured client name.
pub struct Version {
    software: SoftwareVersion,
}

impl Version {
    pub fn new(name: &str, version: &str) -> Self {
        Version {
            software: SoftwareVersion {
                name: name.to_string(),
                version: version.to_string(),
                os: Some(std::env::consts::OS.to_string()),
            },
        }
    }
}

#[async_trait]
impl Extension for Version {
    fn name(&self) -> &'static str {
        "version"
    }

    async fn handle_iq(&self, session: &Session, iq: &Iq) -> bool {
        if !is_get(iq, "query", VERSION_NS) {
            return false;
        }
        let mut query = Element::with_namespace("query", VERSION_NS)
            .with_child(Element::new("name").with_text(&self.software.name))
            .with_child(Element::new("version").with_text(&self.software.version));
        if let Some(os) = &self.software.os {
            query.push_child(Element::new("os").with_text(os));
        }
        if let Err(err) = session.send(iq.result_reply(Some(query))).await {
            debug!(%err, "cannot answer version query");
        }
        true
    }
}

/// Asks an entity which software it runs.
pub async fn get_version(session: &Session, jid: &Jid) -> Result<SoftwareVersion, ExtensionError> {
    let request = Iq::get(Some(jid), Element::with_namespace("query", VERSION_NS));
    let response = session.request(request).await?;
    let query = response
        .payload()
        .filter(|query| query.is("query", VERSION_NS))
        .ok_or(ExtensionError::BadResponse(description::MISSING_QUERY))?;
    Ok(SoftwareVersion {
        name: query
            .child_text("name")
            .ok_or(ExtensionError::BadResponse(description::NO_VERSION_NAME))?,
        version: query.child_text("version").unwrap_or_default(),
        os: query.child_text("os"),
    })
}
