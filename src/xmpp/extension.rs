/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Pluggable stanza filters.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use tracing::warn;

use super::ExtensionError;
use super::Iq;
use super::Message;
use super::Presence;
use super::Session;
use super::Stanza;

/// A protocol extension plugged into a session.
///
/// Inbound stanzas are offered to the extensions in registration order,
/// the first handler returning `true` consumes the stanza. Handlers run on
/// the dispatch task one at a time, they may await requests on the
/// session but should not block for long.
#[async_trait]
pub trait Extension: Send + Sync {
    fn name(&self) -> &'static str;

    /// A required extension failing to initialize fails the connection.
    fn required(&self) -> bool {
        false
    }

    /// Called once the session is established.
    async fn initialize(&self, _session: &Session) -> Result<(), ExtensionError> {
        Ok(())
    }

    async fn handle_message(&self, _session: &Session, _message: &Message) -> bool {
        false
    }

    async fn handle_presence(&self, _session: &Session, _presence: &Presence) -> bool {
        false
    }

    async fn handle_iq(&self, _session: &Session, _iq: &Iq) -> bool {
        false
    }
}

#[derive(Clone)]
struct Registration {
    extension: Arc<dyn Extension>,
    namespaces: Vec<String>,
}

/// Ordered list of registered extensions.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    registrations: Vec<Registration>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        ExtensionRegistry::default()
    }

    /// Appends an extension, the namespaces are advertised as disco features.
    pub fn register(&mut self, extension: Arc<dyn Extension>, namespaces: &[&str]) {
        debug!(name = extension.name(), "registering extension");
        self.registrations.push(Registration {
            extension,
            namespaces: namespaces.iter().map(|ns| ns.to_string()).collect(),
        });
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Names of the extensions in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registrations
            .iter()
            .map(|registration| registration.extension.name())
    }

    /// All advertised namespaces without duplicates, in registration order.
    pub fn features(&self) -> Vec<String> {
        let mut features: Vec<String> = Vec::new();
        for namespace in self
            .registrations
            .iter()
            .flat_map(|registration| registration.namespaces.iter())
        {
            if !features.contains(namespace) {
                features.push(namespace.clone());
            }
        }
        features
    }

    /// Initializes every extension in registration order.
    ///
    /// Failures of optional extensions are logged and skipped, the first
    /// failing required extension stops the initialization.
    pub async fn initialize_all(
        &self,
        session: &Session,
    ) -> Result<(), (&'static str, ExtensionError)> {
        for registration in &self.registrations {
            let extension = &registration.extension;
            match extension.initialize(session).await {
                Ok(()) => debug!(name = extension.name(), "extension initialized"),
                Err(err) if extension.required() => return Err((extension.name(), err)),
                Err(err) => warn!(name = extension.name(), %err, "extension failed to initialize"),
            }
        }
        Ok(())
    }

    /// Offers the stanza to each extension until one consumes it.
    pub async fn dispatch(&self, session: &Session, stanza: &Stanza) -> bool {
        for registration in &self.registrations {
            let extension = &registration.extension;
            let consumed = match stanza {
                Stanza::Message(message) => extension.handle_message(session, message).await,
                Stanza::Presence(presence) => extension.handle_presence(session, presence).await,
                Stanza::Iq(iq) => extension.handle_iq(session, iq).await,
            };
            if consumed {
                debug!(name = extension.name(), "stanza consumed by extension");
                return true;
            }
        }
        false
    }
}
