/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

pub(super) mod description {
    pub(in super::super) const ZERO_OUTBOUND_QUEUE: &str = "outbound_queue must be at least 1";
    pub(in super::super) const ZERO_EVENT_QUEUE: &str = "event_queue must be at least 1";
    pub(in super::super) const ZERO_PORT: &str = "port must not be 0";
    pub(in super::super) const ZERO_CONNECT_TIMEOUT: &str = "connect_timeout_ms must not be 0";
}
