/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Client to server stream negotiation.
//!
//! The negotiation owns the stream until a resource is bound, it is a
//! straight sequence of request and response steps so it does not need
//! the dispatch machinery of an established session.

use std::fmt::Display;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;
use tracing::info;

use crate::Element;
use crate::xmpp::BoxedStream;
use crate::xmpp::ConnectError;
use crate::xmpp::Iq;
use crate::xmpp::IqType;
use crate::xmpp::Jid;
use crate::xmpp::StanzaAttributes;
use crate::xmpp::TlsPolicy;
use crate::xmpp::TlsUpgrade;
use crate::xmpp::TransportError;
use crate::xmpp::XmlStream;
use crate::xmpp::constants::BIND_NS;
use crate::xmpp::constants::FEATURES_TAG;
use crate::xmpp::constants::SASL_NS;
use crate::xmpp::constants::SESSION_NS;
use crate::xmpp::constants::TLS_NS;
use crate::xmpp::error::description;
use crate::xmpp::sasl;
use crate::xmpp::sasl::Mechanism;
use crate::xmpp::sasl::SaslError;

const BIND_ID: &str = "bind_1";
const SESSION_ID: &str = "sess_1";

/// Where a session is in its lifetime.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SessionState {
    Disconnected,
    StreamOpened,
    TlsNegotiating,
    Authenticating,
    Binding,
    SessionEstablished,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::StreamOpened => "stream-opened",
            SessionState::TlsNegotiating => "tls-negotiating",
            SessionState::Authenticating => "authenticating",
            SessionState::Binding => "binding",
            SessionState::SessionEstablished => "session-established",
            SessionState::Failed => "failed",
        }
    }

    /// True if a new connection attempt may start from this state.
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Disconnected | SessionState::Failed)
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of one negotiation run.
pub(crate) struct Negotiation<'a> {
    pub jid: &'a Jid,
    pub password: &'a str,
    pub resource: Option<&'a str>,
    pub tls_policy: TlsPolicy,
    pub tls: &'a dyn TlsUpgrade,
    /// Bound for stream headers, features and the TLS handshake.
    pub connect_timeout: Option<Duration>,
    /// Bound for each SASL round and the bind and session requests.
    pub request_timeout: Option<Duration>,
}

/// A stream ready for stanza exchange.
pub(crate) struct Negotiated {
    pub stream: XmlStream,
    pub jid: Jid,
}

fn sasl_payload(data: &[u8]) -> String {
    // RFC 6120 6.4.2, an empty response is sent as a single equals sign
    if data.is_empty() {
        "=".to_string()
    } else {
        BASE64.encode(data)
    }
}

fn decode_sasl(element: &Element) -> Result<Vec<u8>, ConnectError> {
    let text = element.text();
    let text = text.trim();
    if text.is_empty() || text == "=" {
        return Ok(Vec::new());
    }
    BASE64
        .decode(text)
        .map_err(|err| ConnectError::AuthenticationFailed(format!("bad base64 from server: {err}")))
}

fn sasl_failure_reason(failure: &Element) -> String {
    let condition = failure
        .tags()
        .find(|tag| tag.name() != "text")
        .map(|tag| tag.name().to_string())
        .unwrap_or_else(|| "not-authorized".to_string());
    match failure.child_text("text") {
        Some(text) => format!("{condition}: {text}"),
        None => condition,
    }
}

async fn bounded<T>(
    timeout: Option<Duration>,
    step: impl Future<Output = Result<T, TransportError>>,
) -> Result<T, ConnectError> {
    let result = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, step)
            .await
            .map_err(|_| ConnectError::Timeout)?,
        None => step.await,
    };
    Ok(result?)
}

/// Runs a mechanism step off the async workers, key derivation is slow.
async fn mechanism_step<T: Send + 'static>(
    mut mechanism: Box<dyn Mechanism>,
    step: impl FnOnce(&mut dyn Mechanism) -> Result<T, SaslError> + Send + 'static,
) -> Result<(Box<dyn Mechanism>, T), ConnectError> {
    let (mechanism, result) = tokio::task::spawn_blocking(move || {
        let result = step(mechanism.as_mut());
        (mechanism, result)
    })
    .await
    .map_err(|err| ConnectError::AuthenticationFailed(err.to_string()))?;
    Ok((mechanism, result?))
}

impl Negotiation<'_> {
    async fn read(
        &self,
        stream: &mut XmlStream,
        timeout: Option<Duration>,
    ) -> Result<Element, ConnectError> {
        bounded(timeout, stream.next_element()).await
    }

    async fn read_features(&self, stream: &mut XmlStream) -> Result<Element, ConnectError> {
        let features = self.read(stream, self.connect_timeout).await?;
        if features.name() != FEATURES_TAG {
            return Err(ConnectError::Stream(description::NOT_FEATURES.to_string()));
        }
        Ok(features)
    }

    /// Runs the whole negotiation, reporting every state change.
    pub async fn run(
        &self,
        stream: BoxedStream,
        report: &mut (dyn FnMut(SessionState) + Send),
    ) -> Result<Negotiated, ConnectError> {
        let mut stream = XmlStream::new(stream, self.jid.domainpart());
        bounded(self.connect_timeout, stream.open()).await?;
        report(SessionState::StreamOpened);
        let mut features = self.read_features(&mut stream).await?;

        let starttls = features.find_tag_ns("starttls", TLS_NS).is_some();
        match (starttls, self.tls_policy) {
            (true, TlsPolicy::Optional | TlsPolicy::Required) => {
                report(SessionState::TlsNegotiating);
                stream = self.starttls(stream).await?;
                report(SessionState::StreamOpened);
                features = self.read_features(&mut stream).await?;
            }
            (false, TlsPolicy::Required) => {
                return Err(ConnectError::Tls(description::NO_STARTTLS.to_string()));
            }
            _ => debug!(offered = starttls, "continuing without TLS"),
        }

        report(SessionState::Authenticating);
        self.authenticate(&mut stream, &features).await?;
        bounded(self.connect_timeout, stream.restart()).await?;
        let features = self.read_features(&mut stream).await?;

        report(SessionState::Binding);
        let jid = self.bind(&mut stream, &features).await?;
        if let Some(session) = features.find_tag_ns("session", SESSION_NS)
            && session.find_tag("optional").is_none()
        {
            self.start_session(&mut stream).await?;
        }
        info!(jid = %jid, "session negotiated");
        Ok(Negotiated { stream, jid })
    }

    async fn starttls(&self, mut stream: XmlStream) -> Result<XmlStream, ConnectError> {
        stream
            .send_element(&Element::with_namespace("starttls", TLS_NS))
            .await?;
        let answer = self.read(&mut stream, self.connect_timeout).await?;
        if !answer.is("proceed", TLS_NS) {
            return Err(ConnectError::Tls(description::TLS_REFUSED.to_string()));
        }
        let mut stream = bounded(self.connect_timeout, stream.starttls(self.tls)).await?;
        bounded(self.connect_timeout, stream.restart()).await?;
        Ok(stream)
    }

    async fn authenticate(
        &self,
        stream: &mut XmlStream,
        features: &Element,
    ) -> Result<(), ConnectError> {
        let offered: Vec<String> = features
            .find_tag_ns("mechanisms", SASL_NS)
            .map(|mechanisms| {
                mechanisms
                    .tags()
                    .filter(|tag| tag.name() == "mechanism")
                    .map(|tag| tag.text().trim().to_string())
                    .collect()
            })
            .unwrap_or_default();
        if offered.is_empty() {
            return Err(ConnectError::AuthenticationFailed(
                description::NO_MECHANISMS.to_string(),
            ));
        }
        let username = self.jid.localpart().unwrap_or_default();
        let mut mechanism = sasl::select_mechanism(offered.as_slice(), username, self.password)?;
        debug!(mechanism = mechanism.name(), "authenticating");

        let initial = mechanism.initial_response()?;
        let auth = Element::with_namespace("auth", SASL_NS)
            .with_attribute("mechanism", mechanism.name())
            .with_text(&sasl_payload(&initial));
        stream.send_element(&auth).await?;

        loop {
            let element = self.read(stream, self.request_timeout).await?;
            if element.is("challenge", SASL_NS) {
                let challenge = decode_sasl(&element)?;
                let (next, response) =
                    mechanism_step(mechanism, move |mechanism| mechanism.respond(&challenge))
                        .await?;
                mechanism = next;
                let response =
                    Element::with_namespace("response", SASL_NS).with_text(&sasl_payload(&response));
                stream.send_element(&response).await?;
            } else if element.is("success", SASL_NS) {
                let data = decode_sasl(&element)?;
                mechanism_step(mechanism, move |mechanism| mechanism.success(&data)).await?;
                return Ok(());
            } else if element.is("failure", SASL_NS) {
                return Err(ConnectError::AuthenticationFailed(sasl_failure_reason(
                    &element,
                )));
            } else {
                return Err(ConnectError::Stream(
                    description::UNEXPECTED_ELEMENT.to_string(),
                ));
            }
        }
    }

    /// Sends a negotiation IQ and waits for its response.
    async fn negotiation_iq(
        &self,
        stream: &mut XmlStream,
        mut iq: Iq,
        id: &str,
    ) -> Result<Iq, ConnectError> {
        iq.set_id(Some(id));
        stream.send_element(iq.element()).await?;
        loop {
            let element = self.read(stream, self.request_timeout).await?;
            match Iq::try_from(element) {
                Ok(response) if response.id() == Some(id) && response.is_response() => {
                    return Ok(response);
                }
                Ok(other) => debug!(id = other.id(), "ignoring iq during negotiation"),
                Err(err) => debug!(%err, "ignoring element during negotiation"),
            }
        }
    }

    async fn bind(&self, stream: &mut XmlStream, features: &Element) -> Result<Jid, ConnectError> {
        if features.find_tag_ns("bind", BIND_NS).is_none() {
            return Err(ConnectError::BindingFailed(description::NO_BIND.to_string()));
        }
        let mut bind = Element::with_namespace("bind", BIND_NS);
        if let Some(resource) = self.resource {
            bind.push_child(Element::new("resource").with_text(resource));
        }
        let response = self
            .negotiation_iq(stream, Iq::set(None, bind), BIND_ID)
            .await?;
        if let Some(error) = response.remote_error() {
            return Err(ConnectError::BindingFailed(error.to_string()));
        }
        response
            .payload()
            .and_then(|bind| bind.child_text("jid"))
            .and_then(|jid| Jid::parse(jid.trim()).ok())
            .ok_or_else(|| ConnectError::BindingFailed(description::BIND_NO_JID.to_string()))
    }

    async fn start_session(&self, stream: &mut XmlStream) -> Result<(), ConnectError> {
        let iq = Iq::set(None, Element::with_namespace("session", SESSION_NS));
        let response = self.negotiation_iq(stream, iq, SESSION_ID).await?;
        match response.kind() {
            IqType::Result => Ok(()),
            _ => Err(ConnectError::BindingFailed(format!(
                "session establishment: {}",
                response
                    .remote_error()
                    .map(|error| error.to_string())
                    .unwrap_or_default()
            ))),
        }
    }
}
