/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::Mechanism;
use super::SaslError;
use super::error::description;

/// RFC 4616 PLAIN, the password is sent in clear.
pub struct Plain {
    username: String,
    password: String,
}

impl Plain {
    pub fn new(username: &str, password: &str) -> Self {
        Plain {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl Mechanism for Plain {
    fn name(&self) -> &'static str {
        "PLAIN"
    }

    fn initial_response(&mut self) -> Result<Vec<u8>, SaslError> {
        let mut data = Vec::with_capacity(2 + self.username.len() + self.password.len());
        data.push(0);
        data.extend_from_slice(self.username.as_bytes());
        data.push(0);
        data.extend_from_slice(self.password.as_bytes());
        Ok(data)
    }

    fn respond(&mut self, _challenge: &[u8]) -> Result<Vec<u8>, SaslError> {
        Err(SaslError::BadExchange(description::UNEXPECTED_CHALLENGE))
    }

    fn success(&mut self, _data: &[u8]) -> Result<(), SaslError> {
        Ok(())
    }
}
