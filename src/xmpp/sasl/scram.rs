/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::Hmac;
use hmac::Mac;
use rand::Rng;
use rand::distr::Alphanumeric;
use sha1::Sha1;
use sha2::Digest;
use sha2::Sha256;

use super::Mechanism;
use super::SaslError;
use super::error::description;

const NONCE_SIZE: usize = 24;

/// Upper bound on the server chosen PBKDF2 iteration count.
pub const MAX_ITERATIONS: u32 = 1_000_000;

// No channel binding, base64 of the "n,," header
const GS2_HEADER: &str = "n,,";
const CHANNEL_BINDING: &str = "biws";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScramHash {
    Sha1,
    Sha256,
}

impl ScramHash {
    fn hmac(self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, SaslError> {
        let bad_key = |_| SaslError::BadExchange(description::BAD_KEY);
        Ok(match self {
            ScramHash::Sha1 => {
                let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(bad_key)?;
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            ScramHash::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(bad_key)?;
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        })
    }

    fn hash(self, data: &[u8]) -> Vec<u8> {
        match self {
            ScramHash::Sha1 => Sha1::digest(data).to_vec(),
            ScramHash::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    // Hi() of RFC 5802 is PBKDF2 with HMAC as the PRF
    fn salted_password(self, password: &[u8], salt: &[u8], iterations: u32) -> Vec<u8> {
        match self {
            ScramHash::Sha1 => {
                let mut out = [0u8; 20];
                pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, iterations, &mut out);
                out.to_vec()
            }
            ScramHash::Sha256 => {
                let mut out = [0u8; 32];
                pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
                out.to_vec()
            }
        }
    }
}

enum State {
    Initial,
    ClientFirstSent { client_first_bare: String },
    ClientFinalSent { server_signature: Vec<u8> },
    Verified,
}

/// RFC 5802 SCRAM without channel binding.
pub struct Scram {
    hash: ScramHash,
    username: String,
    password: String,
    client_nonce: String,
    state: State,
}

fn escape_username(username: &str) -> String {
    username.replace('=', "=3D").replace(',', "=2C")
}

fn attribute<'a>(message: &'a str, name: char) -> Option<&'a str> {
    message.split(',').find_map(|part| {
        let mut chars = part.chars();
        if chars.next() == Some(name) && chars.next() == Some('=') {
            Some(&part[2..])
        } else {
            None
        }
    })
}

impl Scram {
    pub fn new(hash: ScramHash, username: &str, password: &str) -> Self {
        let client_nonce: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_SIZE)
            .map(char::from)
            .collect();
        Self::with_nonce(hash, username, password, &client_nonce)
    }

    pub(super) fn with_nonce(
        hash: ScramHash,
        username: &str,
        password: &str,
        client_nonce: &str,
    ) -> Self {
        Scram {
            hash,
            username: username.to_string(),
            password: password.to_string(),
            client_nonce: client_nonce.to_string(),
            state: State::Initial,
        }
    }

    fn client_final(
        &self,
        client_first_bare: &str,
        server_first: &str,
    ) -> Result<(String, Vec<u8>), SaslError> {
        let missing = SaslError::BadExchange(description::MISSING_ATTRIBUTE);
        if let Some(message) = attribute(server_first, 'e') {
            return Err(SaslError::ServerError(message.to_string()));
        }
        let nonce = attribute(server_first, 'r').ok_or(missing.clone())?;
        let salt = attribute(server_first, 's').ok_or(missing.clone())?;
        let iterations = attribute(server_first, 'i').ok_or(missing)?;

        if !nonce.starts_with(&self.client_nonce) || nonce.len() == self.client_nonce.len() {
            return Err(SaslError::BadExchange(description::NONCE_MISMATCH));
        }
        let salt = BASE64
            .decode(salt)
            .map_err(|_| SaslError::BadExchange(description::BAD_SALT))?;
        let iterations = match iterations.parse::<u32>() {
            Ok(count) if count > MAX_ITERATIONS => {
                return Err(SaslError::BadExchange(description::TOO_MANY_ITERATIONS));
            }
            Ok(count) if count > 0 => count,
            _ => return Err(SaslError::BadExchange(description::BAD_ITERATIONS)),
        };

        let salted = self
            .hash
            .salted_password(self.password.as_bytes(), &salt, iterations);
        let client_key = self.hash.hmac(&salted, b"Client Key")?;
        let stored_key = self.hash.hash(&client_key);
        let without_proof = format!("c={CHANNEL_BINDING},r={nonce}");
        let auth_message = format!("{client_first_bare},{server_first},{without_proof}");
        let client_signature = self.hash.hmac(&stored_key, auth_message.as_bytes())?;
        let proof: Vec<u8> = client_key
            .iter()
            .zip(&client_signature)
            .map(|(key, signature)| key ^ signature)
            .collect();
        let server_key = self.hash.hmac(&salted, b"Server Key")?;
        let server_signature = self.hash.hmac(&server_key, auth_message.as_bytes())?;

        let client_final = format!("{without_proof},p={}", BASE64.encode(proof));
        Ok((client_final, server_signature))
    }

    fn verify(&self, server_final: &[u8], expected: &[u8]) -> Result<(), SaslError> {
        let server_final = std::str::from_utf8(server_final)
            .map_err(|_| SaslError::BadExchange(description::BAD_ENCODING))?;
        if let Some(message) = attribute(server_final, 'e') {
            return Err(SaslError::ServerError(message.to_string()));
        }
        let verifier = attribute(server_final, 'v')
            .ok_or(SaslError::BadExchange(description::MISSING_ATTRIBUTE))?;
        let verifier = BASE64
            .decode(verifier)
            .map_err(|_| SaslError::BadExchange(description::BAD_SIGNATURE))?;
        if verifier != expected {
            return Err(SaslError::ServerSignatureMismatch);
        }
        Ok(())
    }
}

impl Mechanism for Scram {
    fn name(&self) -> &'static str {
        match self.hash {
            ScramHash::Sha1 => "SCRAM-SHA-1",
            ScramHash::Sha256 => "SCRAM-SHA-256",
        }
    }

    fn initial_response(&mut self) -> Result<Vec<u8>, SaslError> {
        let client_first_bare = format!(
            "n={},r={}",
            escape_username(&self.username),
            self.client_nonce
        );
        let message = format!("{GS2_HEADER}{client_first_bare}");
        self.state = State::ClientFirstSent { client_first_bare };
        Ok(message.into_bytes())
    }

    fn respond(&mut self, challenge: &[u8]) -> Result<Vec<u8>, SaslError> {
        match std::mem::replace(&mut self.state, State::Initial) {
            State::ClientFirstSent { client_first_bare } => {
                let server_first = std::str::from_utf8(challenge)
                    .map_err(|_| SaslError::BadExchange(description::BAD_ENCODING))?;
                let (client_final, server_signature) =
                    self.client_final(&client_first_bare, server_first)?;
                self.state = State::ClientFinalSent { server_signature };
                Ok(client_final.into_bytes())
            }
            // Some servers send the verifier as a challenge, and the
            // empty response is followed by a plain <success/>
            State::ClientFinalSent { server_signature } => {
                self.verify(challenge, &server_signature)?;
                self.state = State::Verified;
                Ok(Vec::new())
            }
            State::Initial | State::Verified => {
                Err(SaslError::BadExchange(description::UNEXPECTED_CHALLENGE))
            }
        }
    }

    fn success(&mut self, data: &[u8]) -> Result<(), SaslError> {
        match std::mem::replace(&mut self.state, State::Initial) {
            State::ClientFinalSent { server_signature } => {
                self.verify(data, &server_signature)?;
                self.state = State::Verified;
                Ok(())
            }
            State::Verified => {
                self.state = State::Verified;
                Ok(())
            }
            State::Initial | State::ClientFirstSent { .. } => {
                Err(SaslError::BadExchange(description::UNEXPECTED_SUCCESS))
            }
        }
    }
}
