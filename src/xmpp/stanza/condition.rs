/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::fmt::Display;

use crate::Element;
use crate::xmpp::constants::STANZAS_NS;

use super::StanzaError;

string_enum! {
    /// Stanza error conditions from RFC 6120 section 8.3.3.
    ErrorCondition {
        BadRequest => "bad-request",
        Conflict => "conflict",
        FeatureNotImplemented => "feature-not-implemented",
        Forbidden => "forbidden",
        Gone => "gone",
        InternalServerError => "internal-server-error",
        ItemNotFound => "item-not-found",
        JidMalformed => "jid-malformed",
        NotAcceptable => "not-acceptable",
        NotAllowed => "not-allowed",
        NotAuthorized => "not-authorized",
        PolicyViolation => "policy-violation",
        RecipientUnavailable => "recipient-unavailable",
        Redirect => "redirect",
        RegistrationRequired => "registration-required",
        RemoteServerNotFound => "remote-server-not-found",
        RemoteServerTimeout => "remote-server-timeout",
        ResourceConstraint => "resource-constraint",
        ServiceUnavailable => "service-unavailable",
        SubscriptionRequired => "subscription-required",
        UndefinedCondition => "undefined-condition",
        UnexpectedRequest => "unexpected-request",
    }
}

string_enum! {
    /// How the sender should treat a stanza error.
    ErrorType {
        Auth => "auth",
        Cancel => "cancel",
        Continue => "continue",
        Modify => "modify",
        Wait => "wait",
    }
}

impl ErrorCondition {
    /// The error type recommended by RFC 6120 for this condition.
    pub fn default_type(&self) -> ErrorType {
        match self {
            ErrorCondition::BadRequest
            | ErrorCondition::JidMalformed
            | ErrorCondition::NotAcceptable
            | ErrorCondition::PolicyViolation
            | ErrorCondition::Redirect => ErrorType::Modify,
            ErrorCondition::Forbidden
            | ErrorCondition::NotAuthorized
            | ErrorCondition::RegistrationRequired
            | ErrorCondition::SubscriptionRequired => ErrorType::Auth,
            ErrorCondition::InternalServerError
            | ErrorCondition::RecipientUnavailable
            | ErrorCondition::RemoteServerTimeout
            | ErrorCondition::ResourceConstraint
            | ErrorCondition::UnexpectedRequest => ErrorType::Wait,
            _ => ErrorType::Cancel,
        }
    }
}

/// An `<error/>` element received from the other side.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteError {
    pub kind: ErrorType,
    pub condition: ErrorCondition,
    pub text: Option<String>,
}

impl RemoteError {
    pub fn new(condition: ErrorCondition) -> Self {
        RemoteError {
            kind: condition.default_type(),
            condition,
            text: None,
        }
    }

    /// Parses the `<error/>` child of a stanza.
    ///
    /// Unknown conditions are reported as `undefined-condition` so that a
    /// failed request always carries a usable reason.
    pub fn from_element(error: &Element) -> Self {
        let mut condition = None;
        let mut text = None;
        for child in error.tags() {
            if child.namespace() != Some(STANZAS_NS) {
                continue;
            }
            if child.name() == "text" {
                text = Some(child.text());
            } else if condition.is_none() {
                condition = child.name().parse::<ErrorCondition>().ok();
            }
        }
        let condition = condition.unwrap_or(ErrorCondition::UndefinedCondition);
        let kind = error
            .attribute("type")
            .and_then(|kind| kind.parse().ok())
            .unwrap_or_else(|| condition.default_type());
        RemoteError {
            kind,
            condition,
            text,
        }
    }

    pub fn to_element(&self) -> Element {
        let mut error = Element::new("error")
            .with_attribute("type", self.kind.as_str())
            .with_child(Element::with_namespace(self.condition.as_str(), STANZAS_NS));
        if let Some(text) = &self.text {
            error.push_child(Element::with_namespace("text", STANZAS_NS).with_text(text));
        }
        error
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.condition, self.kind)?;
        if let Some(text) = &self.text {
            write!(f, ": {text}")?;
        }
        Ok(())
    }
}
