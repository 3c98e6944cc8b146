/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! The established session: read loop, IQ correlation and dispatch.

mod pending;

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use parking_lot::Mutex;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::Element;
use crate::xmpp::BoxedStream;
use crate::xmpp::ClientConfig;
use crate::xmpp::ConnectError;
use crate::xmpp::ErrorCondition;
use crate::xmpp::Event;
use crate::xmpp::Extension;
use crate::xmpp::ExtensionRegistry;
use crate::xmpp::Iq;
use crate::xmpp::IqError;
use crate::xmpp::IqType;
use crate::xmpp::Jid;
use crate::xmpp::RemoteError;
use crate::xmpp::Roster;
use crate::xmpp::SessionState;
use crate::xmpp::Stanza;
use crate::xmpp::StanzaAttributes;
use crate::xmpp::StreamReader;
use crate::xmpp::StreamWriter;
use crate::xmpp::im;
use crate::xmpp::negotiation::Negotiation;
use pending::PendingGuard;
use pending::PendingTable;

const ID_PREFIX: &str = "iks";

/// How long close waits for the writer to flush the stream end.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Resources of one connection attempt.
struct Connection {
    generation: u64,
    cancel: CancellationToken,
    // Present only while the session is established
    outbound: Option<mpsc::Sender<Element>>,
    tasks: Vec<JoinHandle<()>>,
}

struct Shared {
    state: watch::Sender<SessionState>,
    jid: RwLock<Option<Jid>>,
    pending: PendingTable,
    connection: Mutex<Option<Connection>>,
    generations: AtomicU64,
    next_id: AtomicU64,
    events: mpsc::Sender<Event>,
    event_receiver: Mutex<Option<mpsc::Receiver<Event>>>,
    registry: Mutex<Arc<ExtensionRegistry>>,
    roster: Mutex<Roster>,
    default_timeout: Option<Duration>,
    outbound_queue: usize,
}

/// Handle to an XMPP session.
///
/// Handles are cheap to clone and all refer to the same session. The
/// session outlives connections: after a close or a failure it can be
/// connected again.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl Session {
    pub fn new(config: &ClientConfig) -> Session {
        let (state, _) = watch::channel(SessionState::Disconnected);
        let (events, event_receiver) = mpsc::channel(config.event_queue.max(1));
        Session {
            shared: Arc::new(Shared {
                state,
                jid: RwLock::new(None),
                pending: PendingTable::new(),
                connection: Mutex::new(None),
                generations: AtomicU64::new(0),
                next_id: AtomicU64::new(0),
                events,
                event_receiver: Mutex::new(Some(event_receiver)),
                registry: Mutex::new(Arc::new(ExtensionRegistry::new())),
                roster: Mutex::new(Roster::new()),
                default_timeout: config.default_timeout(),
                outbound_queue: config.outbound_queue.max(1),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Full jid bound to the session, while connected.
    pub fn current_jid(&self) -> Option<Jid> {
        self.shared.jid.read().clone()
    }

    /// Takes the receiving end of the event channel.
    ///
    /// There is a single receiver, later calls return `None`.
    pub fn take_events(&self) -> Option<mpsc::Receiver<Event>> {
        self.shared.event_receiver.lock().take()
    }

    /// Appends an extension; only possible while not connected.
    pub fn register(
        &self,
        extension: Arc<dyn Extension>,
        namespaces: &[&str],
    ) -> Result<(), ConnectError> {
        if self.shared.connection.lock().is_some() {
            return Err(ConnectError::AlreadyConnected);
        }
        let mut registry = self.shared.registry.lock();
        Arc::make_mut(&mut registry).register(extension, namespaces);
        Ok(())
    }

    /// Namespaces advertised by the registered extensions.
    pub fn features(&self) -> Vec<String> {
        self.shared.registry.lock().features()
    }

    /// Roster as last received from the server.
    pub fn roster(&self) -> Roster {
        self.shared.roster.lock().clone()
    }

    pub(crate) fn update_roster<R>(&self, update: impl FnOnce(&mut Roster) -> R) -> R {
        update(&mut *self.shared.roster.lock())
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.shared.default_timeout
    }

    /// Generates a stanza id unique within the session.
    pub fn next_id(&self) -> String {
        let counter = self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{ID_PREFIX}{counter}")
    }

    /// Number of IQ requests waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    fn outbound(&self) -> Result<mpsc::Sender<Element>, IqError> {
        self.shared
            .connection
            .lock()
            .as_ref()
            .and_then(|connection| connection.outbound.clone())
            .ok_or(IqError::NotConnected)
    }

    /// Queues a stanza for sending.
    ///
    /// Waits while the outbound queue is full.
    pub async fn send(&self, stanza: impl Into<Element>) -> Result<(), IqError> {
        let outbound = self.outbound()?;
        outbound
            .send(stanza.into())
            .await
            .map_err(|_| IqError::NotConnected)
    }

    /// Sends an IQ request and waits for its response with the default timeout.
    pub async fn request(&self, iq: Iq) -> Result<Iq, IqError> {
        self.request_with_timeout(iq, self.shared.default_timeout)
            .await
    }

    /// Sends an IQ request and waits for its response.
    ///
    /// An id is allocated if the request has none. A `None` timeout waits
    /// until the response arrives or the session closes.
    pub async fn request_with_timeout(
        &self,
        mut iq: Iq,
        timeout: Option<Duration>,
    ) -> Result<Iq, IqError> {
        let id = iq.id().map(str::to_string).unwrap_or_else(|| self.next_id());
        iq.set_id(Some(&id));
        let (outbound, (token, receiver)) = {
            // Registering under the connection lock means a concurrent close
            // either sees the entry or leaves us without a connection
            let connection = self.shared.connection.lock();
            let outbound = connection
                .as_ref()
                .and_then(|connection| connection.outbound.clone())
                .ok_or(IqError::NotConnected)?;
            (outbound, self.shared.pending.insert(&id)?)
        };
        let _guard = PendingGuard {
            table: &self.shared.pending,
            id: id.clone(),
            token,
        };

        outbound
            .send(iq.into_element())
            .await
            .map_err(|_| IqError::NotConnected)?;
        let response = match timeout {
            Some(timeout) => match tokio::time::timeout(timeout, receiver).await {
                Ok(response) => response,
                Err(_) => {
                    debug!(%id, "request timed out");
                    return Err(IqError::Timeout);
                }
            },
            None => receiver.await,
        };
        let response = response.map_err(|_| IqError::Cancelled)??;
        if response.kind() == IqType::Error {
            let error = response
                .remote_error()
                .unwrap_or_else(|| RemoteError::new(ErrorCondition::UndefinedCondition));
            return Err(IqError::Remote(error));
        }
        Ok(response)
    }

    /// Publishes an event, dropping it if the application is not keeping up.
    pub(crate) fn emit(&self, event: Event) {
        match self.shared.events.try_send(event) {
            Ok(()) => (),
            Err(TrySendError::Full(event)) => warn!(?event, "event queue is full, dropping event"),
            Err(TrySendError::Closed(_)) => (),
        }
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.shared.state.send_replace(state);
        if previous != state {
            info!(from = %previous, to = %state, "session state changed");
            self.emit(Event::StatusChanged(state));
        }
    }

    /// Opens the connection, negotiates the stream and starts the session
    /// tasks.
    ///
    /// A failing `connect` fails the session like any later step does.
    /// Returns the roster once the session is established and the
    /// extensions are initialized.
    pub(crate) async fn establish(
        &self,
        connect: impl Future<Output = Result<BoxedStream, ConnectError>>,
        negotiation: &Negotiation<'_>,
    ) -> Result<Roster, ConnectError> {
        let generation = self.shared.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = {
            let mut connection = self.shared.connection.lock();
            if connection.is_some() {
                return Err(ConnectError::AlreadyConnected);
            }
            let cancel = CancellationToken::new();
            *connection = Some(Connection {
                generation,
                cancel: cancel.clone(),
                outbound: None,
                tasks: Vec::new(),
            });
            cancel
        };
        self.shared.jid.write().take();

        let negotiated = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ConnectError::Cancelled),
            negotiated = async {
                let stream = connect.await?;
                let mut report = |state: SessionState| self.set_state(state);
                negotiation.run(stream, &mut report).await
            } => negotiated,
        };
        let negotiated = match negotiated {
            Ok(negotiated) => negotiated,
            Err(err) => {
                warn!(%err, "connection failed");
                self.shutdown(Some(generation), SessionState::Failed, Some(err.to_string()));
                return Err(err);
            }
        };

        let jid = negotiated.jid;
        let (reader, writer) = negotiated.stream.into_split();
        let (outbound, outbound_rx) = mpsc::channel(self.shared.outbound_queue);
        let (dispatch, dispatch_rx) = mpsc::unbounded_channel();
        let registry = self.shared.registry.lock().clone();
        {
            let mut connection = self.shared.connection.lock();
            let Some(connection) = connection
                .as_mut()
                .filter(|connection| connection.generation == generation)
            else {
                return Err(ConnectError::Cancelled);
            };
            // Published before the tasks run, so a failing reader always
            // has the last word on the state
            *self.shared.jid.write() = Some(jid.clone());
            self.set_state(SessionState::SessionEstablished);
            connection.outbound = Some(outbound);
            connection.tasks.push(tokio::spawn(write_loop(
                self.clone(),
                generation,
                writer,
                outbound_rx,
                cancel.clone(),
            )));
            connection.tasks.push(tokio::spawn(dispatch_loop(
                self.clone(),
                registry.clone(),
                dispatch_rx,
                cancel.clone(),
            )));
            connection.tasks.push(tokio::spawn(read_loop(
                self.clone(),
                generation,
                reader,
                dispatch,
                cancel,
            )));
        }

        let roster = match im::get_roster(self).await {
            Ok(roster) => roster,
            Err(err) => {
                self.shutdown(
                    Some(generation),
                    SessionState::Failed,
                    Some(format!("roster fetch failed: {err}")),
                );
                return Err(ConnectError::Roster(err));
            }
        };
        if let Err((name, source)) = registry.initialize_all(self).await {
            self.shutdown(
                Some(generation),
                SessionState::Failed,
                Some(format!("extension {name} failed: {source}")),
            );
            return Err(ConnectError::ExtensionInitFailed { name, source });
        }
        info!(jid = %jid, "session established");
        Ok(roster)
    }

    /// Tears down the current connection.
    ///
    /// With a generation given, only that connection attempt is torn down.
    /// Returns the session tasks if this call did the teardown.
    fn shutdown(
        &self,
        generation: Option<u64>,
        final_state: SessionState,
        reason: Option<String>,
    ) -> Option<Vec<JoinHandle<()>>> {
        let connection = {
            let mut connection = self.shared.connection.lock();
            match (connection.as_ref(), generation) {
                (None, _) => return None,
                (Some(current), Some(generation)) if current.generation != generation => {
                    return None;
                }
                _ => connection.take()?,
            }
        };
        connection.cancel.cancel();
        let cancelled = self.shared.pending.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "cancelled pending requests");
        }
        self.shared.jid.write().take();
        self.set_state(final_state);
        self.emit(Event::Disconnected(reason));
        Some(connection.tasks)
    }

    pub(crate) fn fail(&self, generation: u64, reason: String) {
        warn!(%reason, "session failed");
        self.shutdown(Some(generation), SessionState::Failed, Some(reason));
    }

    /// Closes the stream and stops the session.
    ///
    /// Pending requests fail with [IqError::Cancelled]. Stanzas queued
    /// before the call are still written, followed by the stream end.
    pub async fn close(&self) {
        let final_state = match self.state() {
            SessionState::SessionEstablished => SessionState::Disconnected,
            _ => SessionState::Failed,
        };
        let Some(tasks) = self.shutdown(None, final_state, None) else {
            return;
        };
        for mut task in tasks {
            if tokio::time::timeout(CLOSE_GRACE, &mut task).await.is_err() {
                task.abort();
            }
        }
        info!("session closed");
    }

    /// Stops the session without waiting for the tasks.
    pub(crate) fn abort(&self) {
        if let Some(tasks) = self.shutdown(None, SessionState::Disconnected, None) {
            for task in tasks {
                task.abort();
            }
        }
    }

    /// Hands an inbound element to its consumer.
    fn route(&self, element: Element, dispatch: &mpsc::UnboundedSender<Stanza>) {
        match Stanza::try_from(element) {
            Ok(Stanza::Iq(iq)) if iq.is_response() => {
                if let Err(iq) = self.shared.pending.fulfil(iq) {
                    debug!(id = iq.id(), "dropping unsolicited iq response");
                }
            }
            Ok(stanza) => {
                // Fails only after the dispatch task stopped
                let _ = dispatch.send(stanza);
            }
            Err(err) => warn!(%err, "dropping malformed stanza"),
        }
    }

    async fn dispatch(&self, registry: &ExtensionRegistry, stanza: Stanza) {
        if registry.dispatch(self, &stanza).await {
            return;
        }
        if im::handle_stanza(self, &stanza).await {
            return;
        }
        match &stanza {
            Stanza::Iq(iq) if iq.is_request() => {
                debug!(
                    id = iq.id(),
                    namespace = iq.payload_namespace(),
                    "no handler for iq request"
                );
                let reply = iq.error_reply(ErrorCondition::FeatureNotImplemented);
                if let Err(err) = self.send(reply).await {
                    debug!(%err, "cannot answer iq request");
                }
            }
            _ => debug!(kind = stanza.element().name(), "dropping unhandled stanza"),
        }
    }
}

async fn read_loop(
    session: Session,
    generation: u64,
    mut reader: StreamReader,
    dispatch: mpsc::UnboundedSender<Stanza>,
    cancel: CancellationToken,
) {
    loop {
        let element = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            element = reader.next_element() => element,
        };
        match element {
            Ok(element) => session.route(element, &dispatch),
            Err(err) => {
                session.fail(generation, err.to_string());
                return;
            }
        }
    }
}

async fn dispatch_loop(
    session: Session,
    registry: Arc<ExtensionRegistry>,
    mut stanzas: mpsc::UnboundedReceiver<Stanza>,
    cancel: CancellationToken,
) {
    loop {
        let stanza = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            stanza = stanzas.recv() => match stanza {
                Some(stanza) => stanza,
                None => return,
            },
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = session.dispatch(&registry, stanza) => (),
        }
    }
}

async fn write_loop(
    session: Session,
    generation: u64,
    mut writer: StreamWriter,
    mut outbound: mpsc::Receiver<Element>,
    cancel: CancellationToken,
) {
    loop {
        let element = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            element = outbound.recv() => match element {
                Some(element) => element,
                None => break,
            },
        };
        if let Err(err) = writer.send_element(&element).await {
            session.fail(generation, err.to_string());
            return;
        }
    }
    while let Ok(element) = outbound.try_recv() {
        if writer.send_element(&element).await.is_err() {
            return;
        }
    }
    if let Err(err) = writer.close().await {
        debug!(%err, "cannot close the stream");
    }
}
