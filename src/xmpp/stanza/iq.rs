/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use crate::Element;
use crate::xmpp::Jid;

use super::ErrorCondition;
use super::RemoteError;
use super::StanzaAttributes;
use super::StanzaError;

string_enum! {
    IqType {
        Error => "error",
        Get => "get",
        Result => "result",
        Set => "set",
    }
}

/// An `<iq/>` stanza.
///
/// Requests (`get` and `set`) carry exactly one payload element, responses
/// are correlated to their request with the `id` attribute.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Iq(pub(super) Element);

impl Iq {
    pub fn new(kind: IqType, to: Option<&Jid>) -> Self {
        let mut iq = Iq(Element::new(Iq::TAG));
        iq.set_kind(kind);
        iq.set_to(to);
        iq
    }

    pub fn get(to: Option<&Jid>, payload: Element) -> Self {
        let mut iq = Iq::new(IqType::Get, to);
        iq.0.push_child(payload);
        iq
    }

    pub fn set(to: Option<&Jid>, payload: Element) -> Self {
        let mut iq = Iq::new(IqType::Set, to);
        iq.0.push_child(payload);
        iq
    }

    pub fn kind(&self) -> IqType {
        self.0
            .attribute("type")
            .and_then(|kind| kind.parse().ok())
            .unwrap_or(IqType::Get)
    }

    pub fn set_kind(&mut self, kind: IqType) {
        self.0.set_attribute("type", Some(kind.as_str().to_string()));
    }

    pub fn is_request(&self) -> bool {
        matches!(self.kind(), IqType::Get | IqType::Set)
    }

    pub fn is_response(&self) -> bool {
        !self.is_request()
    }

    /// The first child element which is not an error report.
    pub fn payload(&self) -> Option<&Element> {
        self.0.tags().find(|tag| tag.name() != "error")
    }

    /// Namespace of the payload element.
    pub fn payload_namespace(&self) -> Option<&str> {
        self.payload().and_then(Element::namespace)
    }

    fn reply(&self, kind: IqType) -> Iq {
        let mut reply = Iq(Element::new(Iq::TAG));
        reply.set_kind(kind);
        reply
            .0
            .set_attribute("to", self.0.attribute("from").map(str::to_string));
        reply
            .0
            .set_attribute("from", self.0.attribute("to").map(str::to_string));
        reply.set_id(self.id());
        reply
    }

    /// Builds the `result` response to this request.
    pub fn result_reply(&self, payload: Option<Element>) -> Iq {
        let mut reply = self.reply(IqType::Result);
        if let Some(payload) = payload {
            reply.0.push_child(payload);
        }
        reply
    }

    /// Builds the `error` response to this request.
    ///
    /// The original payload is echoed back before the error element.
    pub fn error_reply(&self, condition: ErrorCondition) -> Iq {
        let mut reply = self.reply(IqType::Error);
        if let Some(payload) = self.payload() {
            reply.0.push_child(payload.clone());
        }
        reply.0.push_child(RemoteError::new(condition).to_element());
        reply
    }
}

impl TryFrom<Element> for Iq {
    type Error = StanzaError;

    fn try_from(element: Element) -> Result<Self, Self::Error> {
        Iq::check_root(&element)?;
        element
            .attribute("type")
            .unwrap_or_default()
            .parse::<IqType>()?;
        if element.attribute("id").is_none() {
            return Err(StanzaError::MissingId);
        }
        Ok(Iq(element))
    }
}
