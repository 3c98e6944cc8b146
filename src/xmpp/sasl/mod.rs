/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Client side SASL mechanisms for stream authentication.

mod error;
mod plain;
mod scram;

pub use error::SaslError;
pub use plain::Plain;
pub use scram::Scram;
pub use scram::ScramHash;

/// One authentication exchange with a specific mechanism.
///
/// Data is passed around decoded, the negotiation takes care of the base64
/// encoding used on the wire.
pub trait Mechanism: Send {
    /// Registered name, as it appears in `<mechanism/>`.
    fn name(&self) -> &'static str;

    /// Data sent along with `<auth/>`.
    fn initial_response(&mut self) -> Result<Vec<u8>, SaslError>;

    /// Answers a `<challenge/>`.
    fn respond(&mut self, challenge: &[u8]) -> Result<Vec<u8>, SaslError>;

    /// Checks the additional data of `<success/>`.
    fn success(&mut self, data: &[u8]) -> Result<(), SaslError>;
}

/// Mechanisms in order of preference.
pub const PREFERRED_MECHANISMS: [&str; 3] = ["SCRAM-SHA-256", "SCRAM-SHA-1", "PLAIN"];

/// Picks the strongest mechanism the server offers.
pub fn select_mechanism<S: AsRef<str>>(
    offered: &[S],
    username: &str,
    password: &str,
) -> Result<Box<dyn Mechanism>, SaslError> {
    let name = PREFERRED_MECHANISMS
        .into_iter()
        .find(|preferred| offered.iter().any(|name| name.as_ref() == *preferred))
        .ok_or(SaslError::NoCommonMechanism)?;
    Ok(match name {
        "SCRAM-SHA-256" => Box::new(Scram::new(ScramHash::Sha256, username, password)),
        "SCRAM-SHA-1" => Box::new(Scram::new(ScramHash::Sha1, username, password)),
        _ => Box::new(Plain::new(username, password)),
    })
}
