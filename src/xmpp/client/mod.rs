/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! High level client: configuration, connection and the everyday
//! operations in one place.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;

use crate::xmpp::BoxedStream;
use crate::xmpp::ChatState;
use crate::xmpp::ClientConfig;
use crate::xmpp::ClientConfigBuilder;
use crate::xmpp::ConnectError;
use crate::xmpp::Event;
use crate::xmpp::ExtensionError;
use crate::xmpp::IqError;
use crate::xmpp::Jid;
use crate::xmpp::Message;
use crate::xmpp::Roster;
use crate::xmpp::RustlsUpgrade;
use crate::xmpp::Session;
use crate::xmpp::SessionState;
use crate::xmpp::Status;
use crate::xmpp::TlsUpgrade;
use crate::xmpp::connect_tcp;
use crate::xmpp::constants::CUSTOM_IQ_NS;
use crate::xmpp::error::description;
use crate::xmpp::extensions;
use crate::xmpp::extensions::attention;
use crate::xmpp::extensions::blocking;
use crate::xmpp::extensions::chatstates;
use crate::xmpp::extensions::custom;
use crate::xmpp::extensions::custom::CustomIq;
use crate::xmpp::extensions::custom::CustomIqHandler;
use crate::xmpp::extensions::disco;
use crate::xmpp::extensions::disco::DiscoItem;
use crate::xmpp::extensions::disco::Identity;
use crate::xmpp::extensions::muc;
use crate::xmpp::extensions::muc::Affiliation;
use crate::xmpp::extensions::muc::History;
use crate::xmpp::extensions::muc::Role;
use crate::xmpp::extensions::muc::RoomInfo;
use crate::xmpp::extensions::ping;
use crate::xmpp::extensions::privacy;
use crate::xmpp::extensions::privacy::PrivacyList;
use crate::xmpp::extensions::privacy::PrivacyLists;
use crate::xmpp::extensions::time;
use crate::xmpp::extensions::time::EntityTime;
use crate::xmpp::extensions::version;
use crate::xmpp::extensions::version::SoftwareVersion;
use crate::xmpp::im;
use crate::xmpp::negotiation::Negotiation;

/// An XMPP client account.
///
/// ```no_run
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// use iksjab::Jid;
/// use iksjab::XmppClient;
///
/// let config = XmppClient::build(Jid::parse("juliet@example.com")?)
///     .password("r0m30myr0m30")
///     .build()?;
/// let client = XmppClient::new(config)?;
/// let roster = client.connect(Some("balcony")).await?;
/// for item in &roster {
///     println!("{}", item.jid);
/// }
/// client.close().await;
/// # Ok(())
/// # }
/// ```
///
/// Dropping the client stops its session without the closing handshake.
pub struct XmppClient {
    config: ClientConfig,
    session: Session,
    tls: Arc<dyn TlsUpgrade>,
    custom_iq: Arc<CustomIq>,
}

impl XmppClient {
    pub fn build(jid: Jid) -> ClientConfigBuilder {
        ClientConfig::builder(jid)
    }

    /// Creates a client with the built-in extensions registered.
    pub fn new(config: ClientConfig) -> Result<Self, ConnectError> {
        let session = Session::new(&config);
        extensions::register_defaults(&session, &config)?;
        let custom_iq = Arc::new(CustomIq::new());
        session.register(custom_iq.clone(), &[CUSTOM_IQ_NS])?;
        Ok(XmppClient {
            config,
            session,
            tls: Arc::new(RustlsUpgrade::new()),
            custom_iq,
        })
    }

    /// Replaces the TLS implementation, e.g. to trust a private CA.
    pub fn with_tls(mut self, tls: Arc<dyn TlsUpgrade>) -> Self {
        self.tls = tls;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying session, for extensions and raw stanza exchange.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Connects to the server and logs in.
    ///
    /// The resource given here overrides the configured one. If neither
    /// is set the server picks a resource. Returns the roster.
    pub async fn connect(&self, resource: Option<&str>) -> Result<Roster, ConnectError> {
        if !self.session.state().is_idle() {
            return Err(ConnectError::AlreadyConnected);
        }
        let host = self.config.host();
        let port = self.config.port;
        info!(host, port, jid = %self.config.jid, "connecting");
        let connect = async move {
            connect_tcp(host, port, self.config.connect_timeout())
                .await
                .map_err(ConnectError::from)
        };
        self.login(connect, resource).await
    }

    /// Logs in over an already open byte stream.
    pub async fn connect_stream(
        &self,
        stream: BoxedStream,
        resource: Option<&str>,
    ) -> Result<Roster, ConnectError> {
        self.login(std::future::ready(Ok(stream)), resource).await
    }

    async fn login(
        &self,
        connect: impl Future<Output = Result<BoxedStream, ConnectError>>,
        resource: Option<&str>,
    ) -> Result<Roster, ConnectError> {
        let password = self.config.password.as_deref().ok_or_else(|| {
            ConnectError::AuthenticationFailed(description::NO_PASSWORD.to_string())
        })?;
        let negotiation = Negotiation {
            jid: &self.config.jid,
            password,
            resource: resource.or(self.config.resource.as_deref()),
            tls_policy: self.config.tls,
            tls: self.tls.as_ref(),
            connect_timeout: Some(self.config.connect_timeout()),
            request_timeout: self.config.default_timeout(),
        };
        self.session.establish(connect, &negotiation).await
    }

    /// Ends the stream; pending requests fail with [IqError::Cancelled].
    pub async fn close(&self) {
        self.session.close().await;
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn current_jid(&self) -> Option<Jid> {
        self.session.current_jid()
    }

    /// Takes the event receiver, see [Session::take_events].
    pub fn take_events(&self) -> Option<mpsc::Receiver<Event>> {
        self.session.take_events()
    }

    /// Roster as last received from the server.
    pub fn roster(&self) -> Roster {
        self.session.roster()
    }

    pub async fn get_roster(&self) -> Result<Roster, IqError> {
        im::get_roster(&self.session).await
    }

    pub async fn add_contact(
        &self,
        jid: &Jid,
        name: Option<&str>,
        groups: &[&str],
    ) -> Result<(), IqError> {
        im::add_contact(&self.session, jid, name, groups).await
    }

    pub async fn remove_contact(&self, jid: &Jid) -> Result<(), IqError> {
        im::remove_contact(&self.session, jid).await
    }

    pub async fn send_message(&self, message: Message) -> Result<(), IqError> {
        im::send_message(&self.session, message).await
    }

    /// Sends a chat message with a plain body.
    pub async fn send_chat(&self, to: &Jid, body: &str) -> Result<(), IqError> {
        im::send_message(&self.session, Message::chat(to, body)).await
    }

    pub async fn set_status(&self, status: &Status) -> Result<(), IqError> {
        im::set_status(&self.session, status).await
    }

    pub async fn request_subscription(&self, jid: &Jid) -> Result<(), IqError> {
        im::request_subscription(&self.session, jid).await
    }

    pub async fn approve_subscription_request(&self, jid: &Jid) -> Result<(), IqError> {
        im::approve_subscription_request(&self.session, jid).await
    }

    pub async fn refuse_subscription_request(&self, jid: &Jid) -> Result<(), IqError> {
        im::refuse_subscription_request(&self.session, jid).await
    }

    pub async fn unsubscribe(&self, jid: &Jid) -> Result<(), IqError> {
        im::unsubscribe(&self.session, jid).await
    }

    pub async fn revoke_subscription(&self, jid: &Jid) -> Result<(), IqError> {
        im::revoke_subscription(&self.session, jid).await
    }

    pub async fn ping(&self, jid: &Jid) -> Result<Duration, ExtensionError> {
        ping::ping(&self.session, jid).await
    }

    pub async fn get_version(&self, jid: &Jid) -> Result<SoftwareVersion, ExtensionError> {
        version::get_version(&self.session, jid).await
    }

    pub async fn get_features(&self, jid: &Jid) -> Result<Vec<String>, ExtensionError> {
        disco::get_features(&self.session, jid).await
    }

    pub async fn get_identities(&self, jid: &Jid) -> Result<Vec<Identity>, ExtensionError> {
        disco::get_identities(&self.session, jid).await
    }

    pub async fn get_items(&self, jid: &Jid) -> Result<Vec<DiscoItem>, ExtensionError> {
        disco::get_items(&self.session, jid).await
    }

    pub async fn block(&self, jids: &[Jid]) -> Result<(), ExtensionError> {
        blocking::block(&self.session, jids).await
    }

    pub async fn unblock(&self, jids: &[Jid]) -> Result<(), ExtensionError> {
        blocking::unblock(&self.session, jids).await
    }

    pub async fn get_blocklist(&self) -> Result<Vec<Jid>, ExtensionError> {
        blocking::get_blocklist(&self.session).await
    }

    pub async fn discover_rooms(&self, service: &Jid) -> Result<Vec<DiscoItem>, ExtensionError> {
        muc::discover_rooms(&self.session, service).await
    }

    pub async fn get_room_info(&self, room: &Jid) -> Result<RoomInfo, ExtensionError> {
        muc::get_room_info(&self.session, room).await
    }

    pub async fn join_room(
        &self,
        room: &Jid,
        nick: &str,
        password: Option<&str>,
        history: Option<History>,
    ) -> Result<(), ExtensionError> {
        muc::join_room(&self.session, room, nick, password, history).await
    }

    pub async fn leave_room(
        &self,
        room: &Jid,
        nick: &str,
        status: Option<&str>,
    ) -> Result<(), ExtensionError> {
        muc::leave_room(&self.session, room, nick, status).await
    }

    pub async fn set_affiliation(
        &self,
        room: &Jid,
        jid: &Jid,
        affiliation: Affiliation,
        reason: Option<&str>,
    ) -> Result<(), ExtensionError> {
        muc::set_affiliation(&self.session, room, jid, affiliation, reason).await
    }

    pub async fn set_role(
        &self,
        room: &Jid,
        nick: &str,
        role: Role,
        reason: Option<&str>,
    ) -> Result<(), ExtensionError> {
        muc::set_role(&self.session, room, nick, role, reason).await
    }

    pub async fn destroy_room(
        &self,
        room: &Jid,
        reason: Option<&str>,
        alternate: Option<&Jid>,
    ) -> Result<(), ExtensionError> {
        muc::destroy_room(&self.session, room, reason, alternate).await
    }

    pub async fn get_time(&self, jid: &Jid) -> Result<EntityTime, ExtensionError> {
        time::get_time(&self.session, jid).await
    }

    pub async fn buzz(&self, jid: &Jid, message: Option<&str>) -> Result<(), ExtensionError> {
        attention::buzz(&self.session, jid, message).await
    }

    pub async fn set_chat_state(&self, to: &Jid, state: ChatState) -> Result<(), IqError> {
        chatstates::set_chat_state(&self.session, to, state).await
    }

    pub async fn request_custom_iq(
        &self,
        jid: &Jid,
        text: &str,
    ) -> Result<Option<String>, ExtensionError> {
        custom::request_custom_iq(&self.session, jid, text).await
    }

    /// Installs the answer to custom requests, `None` refuses them.
    pub fn set_custom_iq_handler(&self, handler: Option<CustomIqHandler>) {
        self.custom_iq.set_handler(handler);
    }

    pub async fn get_privacy_list_names(&self) -> Result<PrivacyLists, ExtensionError> {
        privacy::get_privacy_list_names(&self.session).await
    }

    pub async fn get_privacy_lists(&self) -> Result<Vec<PrivacyList>, ExtensionError> {
        privacy::get_privacy_lists(&self.session).await
    }

    pub async fn get_privacy_list(&self, name: &str) -> Result<PrivacyList, ExtensionError> {
        privacy::get_privacy_list(&self.session, name).await
    }

    pub async fn edit_privacy_list(&self, list: &PrivacyList) -> Result<(), ExtensionError> {
        privacy::edit_privacy_list(&self.session, list).await
    }

    pub async fn remove_privacy_list(&self, name: &str) -> Result<(), ExtensionError> {
        privacy::remove_privacy_list(&self.session, name).await
    }

    pub async fn get_active_privacy_list(&self) -> Result<Option<String>, ExtensionError> {
        privacy::get_active_privacy_list(&self.session).await
    }

    pub async fn get_default_privacy_list(&self) -> Result<Option<String>, ExtensionError> {
        privacy::get_default_privacy_list(&self.session).await
    }

    pub async fn set_active_privacy_list(&self, name: Option<&str>) -> Result<(), ExtensionError> {
        privacy::set_active_privacy_list(&self.session, name).await
    }

    pub async fn set_default_privacy_list(&self, name: Option<&str>) -> Result<(), ExtensionError> {
        privacy::set_default_privacy_list(&self.session, name).await
    }
}

impl Drop for XmppClient {
    fn drop(&mut self) {
        self.session.abort();
    }
}
