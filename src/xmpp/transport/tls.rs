/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::sync::Arc;

use async_trait::async_trait;
use rustls::ClientConfig;
use rustls::RootCertStore;
use rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;
use tracing::debug;

use super::BoxedStream;
use super::TransportError;

/// Upgrades a plain connection to TLS after `<proceed/>`.
#[async_trait]
pub trait TlsUpgrade: Send + Sync {
    async fn upgrade(
        &self,
        stream: BoxedStream,
        domain: &str,
    ) -> Result<BoxedStream, TransportError>;
}

/// TLS upgrade with rustls, verifying the server against the webpki roots.
pub struct RustlsUpgrade {
    connector: TlsConnector,
}

impl RustlsUpgrade {
    pub fn new() -> Self {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        let config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Self::with_config(Arc::new(config))
    }

    pub fn with_config(config: Arc<ClientConfig>) -> Self {
        RustlsUpgrade {
            connector: TlsConnector::from(config),
        }
    }
}

impl Default for RustlsUpgrade {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TlsUpgrade for RustlsUpgrade {
    async fn upgrade(
        &self,
        stream: BoxedStream,
        domain: &str,
    ) -> Result<BoxedStream, TransportError> {
        let server_name = ServerName::try_from(domain.to_string())
            .map_err(|err| TransportError::Tls(err.to_string()))?;
        let tls_stream = self
            .connector
            .connect(server_name, stream)
            .await
            .map_err(|err| TransportError::Tls(err.to_string()))?;
        debug!(domain, "TLS handshake completed");
        Ok(Box::new(tls_stream))
    }
}
