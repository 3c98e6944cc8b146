/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod error;

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::xmpp::Jid;
use crate::xmpp::constants::CLIENT_PORT;
use error::description;
pub use error::ConfigError;

/// When to negotiate TLS on the client stream.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsPolicy {
    /// Never upgrade, even if the server offers STARTTLS.
    Disabled,
    /// Upgrade when offered.
    Optional,
    /// Fail the connection unless the server offers STARTTLS.
    #[default]
    Required,
}

/// Settings of a client session, immutable once the client is built.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub jid: Jid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Host to connect to instead of the domain of the jid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub tls: TlsPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Timeout of IQ requests, a negative value waits forever.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: i64,
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
    #[serde(default = "default_event_queue")]
    pub event_queue: usize,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default = "default_client_version")]
    pub client_version: String,
}

fn default_port() -> u16 {
    CLIENT_PORT
}

fn default_connect_timeout_ms() -> u64 {
    30_000
}

fn default_timeout_ms() -> i64 {
    15_000
}

fn default_outbound_queue() -> usize {
    64
}

fn default_event_queue() -> usize {
    256
}

fn default_client_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl ClientConfig {
    pub fn builder(jid: Jid) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig {
                jid,
                password: None,
                server: None,
                port: default_port(),
                tls: TlsPolicy::default(),
                resource: None,
                connect_timeout_ms: default_connect_timeout_ms(),
                default_timeout_ms: default_timeout_ms(),
                outbound_queue: default_outbound_queue(),
                event_queue: default_event_queue(),
                client_name: default_client_name(),
                client_version: default_client_version(),
            },
        }
    }

    /// Loads a configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outbound_queue == 0 {
            return Err(ConfigError::Invalid(description::ZERO_OUTBOUND_QUEUE));
        }
        if self.event_queue == 0 {
            return Err(ConfigError::Invalid(description::ZERO_EVENT_QUEUE));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid(description::ZERO_PORT));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid(description::ZERO_CONNECT_TIMEOUT));
        }
        Ok(())
    }

    /// Host name to open the TCP connection to.
    pub fn host(&self) -> &str {
        self.server
            .as_deref()
            .unwrap_or_else(|| self.jid.domainpart())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Timeout of IQ requests, `None` waits forever.
    pub fn default_timeout(&self) -> Option<Duration> {
        u64::try_from(self.default_timeout_ms)
            .ok()
            .map(Duration::from_millis)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("jid", &self.jid)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("server", &self.server)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("resource", &self.resource)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("default_timeout_ms", &self.default_timeout_ms)
            .field("outbound_queue", &self.outbound_queue)
            .field("event_queue", &self.event_queue)
            .field("client_name", &self.client_name)
            .field("client_version", &self.client_version)
            .finish()
    }
}

/// Chained construction of a [ClientConfig].
///
/// ```
/// use iksjab::ClientConfig;
/// use iksjab::TlsPolicy;
///
/// let config = ClientConfig::builder("juliet@example.com".parse().unwrap())
///     .password("r0m30")
///     .tls(TlsPolicy::Optional)
///     .resource("balcony")
///     .build()
///     .unwrap();
/// assert_eq!(config.host(), "example.com");
/// ```
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn password(mut self, password: &str) -> Self {
        self.config.password = Some(password.to_string());
        self
    }

    pub fn server(mut self, server: &str) -> Self {
        self.config.server = Some(server.to_string());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn tls(mut self, tls: TlsPolicy) -> Self {
        self.config.tls = tls;
        self
    }

    pub fn resource(mut self, resource: &str) -> Self {
        self.config.resource = Some(resource.to_string());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the IQ request timeout, `None` waits forever.
    pub fn default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.default_timeout_ms = match timeout {
            Some(timeout) => i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX),
            None => -1,
        };
        self
    }

    pub fn outbound_queue(mut self, size: usize) -> Self {
        self.config.outbound_queue = size;
        self
    }

    pub fn event_queue(mut self, size: usize) -> Self {
        self.config.event_queue = size;
        self
    }

    pub fn client_name(mut self, name: &str, version: &str) -> Self {
        self.config.client_name = name.to_string();
        self.config.client_version = version.to_string();
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests;
