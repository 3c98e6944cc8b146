/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::xmpp::Iq;
use crate::xmpp::IqError;
use crate::xmpp::StanzaAttributes;

type Responder = oneshot::Sender<Result<Iq, IqError>>;

struct Entry {
    // Tells apart requests which reused the id of a finished one
    token: u64,
    responder: Responder,
}

#[derive(Default)]
struct Entries {
    by_id: HashMap<String, Entry>,
    next_token: u64,
}

/// Outstanding IQ requests by id.
///
/// Every entry is removed exactly once, whichever of response, timeout or
/// cancellation comes first; later removals find nothing and do nothing.
#[derive(Default)]
pub(crate) struct PendingTable {
    entries: Mutex<Entries>,
}

impl PendingTable {
    pub fn new() -> Self {
        PendingTable::default()
    }

    /// Registers a request, returning its token and the response receiver.
    pub fn insert(
        &self,
        id: &str,
    ) -> Result<(u64, oneshot::Receiver<Result<Iq, IqError>>), IqError> {
        let mut entries = self.entries.lock();
        if entries.by_id.contains_key(id) {
            return Err(IqError::DuplicateId(id.to_string()));
        }
        entries.next_token += 1;
        let token = entries.next_token;
        let (responder, receiver) = oneshot::channel();
        entries
            .by_id
            .insert(id.to_string(), Entry { token, responder });
        Ok((token, receiver))
    }

    /// Delivers a response to its waiting request.
    ///
    /// The response is given back if no request is waiting for it.
    pub fn fulfil(&self, response: Iq) -> Result<(), Iq> {
        let entry = match response.id() {
            Some(id) => self.entries.lock().by_id.remove(id),
            None => None,
        };
        match entry {
            // The requester may have given up already, that is not an error
            Some(entry) => {
                let _ = entry.responder.send(Ok(response));
                Ok(())
            }
            None => Err(response),
        }
    }

    /// Removes the entry of the request holding `token`.
    pub fn remove(&self, id: &str, token: u64) -> bool {
        let mut entries = self.entries.lock();
        let owned = entries
            .by_id
            .get(id)
            .is_some_and(|entry| entry.token == token);
        if owned {
            entries.by_id.remove(id);
        }
        owned
    }

    /// Fails every outstanding request with [IqError::Cancelled].
    pub fn cancel_all(&self) -> usize {
        let entries: Vec<Entry> = self
            .entries
            .lock()
            .by_id
            .drain()
            .map(|(_, entry)| entry)
            .collect();
        let count = entries.len();
        for entry in entries {
            let _ = entry.responder.send(Err(IqError::Cancelled));
        }
        count
    }

    pub fn len(&self) -> usize {
        self.entries.lock().by_id.len()
    }
}

/// Removes the entry when the waiting request goes away for any reason.
pub(crate) struct PendingGuard<'a> {
    pub table: &'a PendingTable,
    pub id: String,
    pub token: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.table.remove(&self.id, self.token);
    }
}
