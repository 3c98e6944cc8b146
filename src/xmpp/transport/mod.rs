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
mod tls;

use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::ReadHalf;
use tokio::io::WriteHalf;
use tokio::net::TcpStream;
use tracing::debug;
use tracing::trace;

use crate::Element;
use crate::xmpp::StreamElement;
use crate::xmpp::StreamParser;
use crate::xmpp::constants::CLIENT_NS;
use crate::xmpp::constants::ERROR_TAG;
use crate::xmpp::constants::STREAM_ERRORS_NS;
use crate::xmpp::constants::STREAM_NS;
use error::description;
pub use error::TransportError;
pub use tls::RustlsUpgrade;
pub use tls::TlsUpgrade;

const READ_BUFFER_SIZE: usize = 4096;

const STREAM_END: &str = "</stream:stream>";

/// Byte stream an XMPP session can run over.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> AsyncStream for T {}

pub type BoxedStream = Box<dyn AsyncStream>;

/// Opens a TCP connection within the given time.
pub async fn connect_tcp(
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<BoxedStream, TransportError> {
    debug!(host, port, "connecting");
    let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| TransportError::Timeout)??;
    stream.set_nodelay(true)?;
    Ok(Box::new(stream))
}

fn stream_header(domain: &str) -> String {
    format!(
        "<?xml version='1.0'?><stream:stream xmlns='{CLIENT_NS}' \
         xmlns:stream='{STREAM_NS}' version='1.0' to='{domain}'>"
    )
}

fn check_header(header: &Element) -> Result<(), TransportError> {
    if header.attribute("xmlns:stream") != Some(STREAM_NS) {
        return Err(TransportError::BadStream(description::HEADER_NAMESPACE));
    }
    match header.attribute("version") {
        Some(version) if version.starts_with("1.") => Ok(()),
        _ => Err(TransportError::BadStream(description::HEADER_VERSION)),
    }
}

/// Defined condition of a `<stream:error/>` element.
fn stream_error_condition(error: &Element) -> String {
    error
        .tags()
        .find(|tag| tag.name() != "text" && tag.namespace() == Some(STREAM_ERRORS_NS))
        .map(|tag| tag.name().to_string())
        .unwrap_or_else(|| "undefined-condition".to_string())
}

/// Turns a top level stream construct into an element for the session.
fn stanza_level(element: StreamElement) -> Result<Element, TransportError> {
    match element {
        StreamElement::Element(element) if element.name() == ERROR_TAG => {
            Err(TransportError::StreamError(stream_error_condition(&element)))
        }
        StreamElement::Element(element) => Ok(element),
        StreamElement::Start(_) => Err(TransportError::BadStream(description::UNEXPECTED_HEADER)),
        StreamElement::End => Err(TransportError::StreamClosed),
    }
}

/// Inbound half of the stream parsing state.
///
/// Kept separate from the socket so that elements already parsed stay
/// queued when the socket is split between tasks.
struct Inbound {
    parser: StreamParser,
    buffer: Box<[u8]>,
}

impl Inbound {
    fn new() -> Self {
        Inbound {
            parser: StreamParser::new(),
            buffer: vec![0; READ_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    async fn next<R: AsyncRead + Unpin + ?Sized>(
        &mut self,
        reader: &mut R,
    ) -> Result<StreamElement, TransportError> {
        loop {
            if let Some(element) = self.parser.next_element() {
                return Ok(element);
            }
            let nr_read = reader.read(&mut self.buffer).await?;
            if nr_read == 0 {
                return Err(TransportError::UnexpectedEof);
            }
            let bytes = &self.buffer[..nr_read];
            trace!(target: "iksjab::wire", "RECV {}", String::from_utf8_lossy(bytes));
            self.parser.parse_bytes(bytes)?;
        }
    }
}

async fn write_str<W: AsyncWrite + Unpin + ?Sized>(
    writer: &mut W,
    data: &str,
) -> Result<(), TransportError> {
    trace!(target: "iksjab::wire", "SEND {data}");
    writer.write_all(data.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// An XML stream during negotiation, owned by a single task.
pub struct XmlStream {
    stream: BoxedStream,
    inbound: Inbound,
    domain: String,
    stream_id: Option<String>,
}

impl XmlStream {
    pub fn new(stream: BoxedStream, domain: &str) -> Self {
        XmlStream {
            stream,
            inbound: Inbound::new(),
            domain: domain.to_string(),
            stream_id: None,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Id the server assigned to the current stream.
    pub fn stream_id(&self) -> Option<&str> {
        self.stream_id.as_deref()
    }

    /// Sends our stream header and waits for the server's.
    pub async fn open(&mut self) -> Result<Element, TransportError> {
        write_str(&mut self.stream, &stream_header(&self.domain)).await?;
        match self.inbound.next(&mut self.stream).await? {
            StreamElement::Start(header) => {
                check_header(&header)?;
                self.stream_id = header.attribute("id").map(str::to_string);
                Ok(header)
            }
            other => stanza_level(other).and(Err(TransportError::BadStream(
                description::UNEXPECTED_HEADER,
            ))),
        }
    }

    /// Discards the parser state and exchanges new stream headers.
    pub async fn restart(&mut self) -> Result<Element, TransportError> {
        self.inbound.parser.reset();
        self.stream_id = None;
        self.open().await
    }

    /// Waits for the next complete top level element.
    pub async fn next_element(&mut self) -> Result<Element, TransportError> {
        let element = self.inbound.next(&mut self.stream).await?;
        stanza_level(element)
    }

    pub async fn send_element(&mut self, element: &Element) -> Result<(), TransportError> {
        write_str(&mut self.stream, &element.to_string()).await
    }

    /// Replaces the socket with a TLS session over it.
    ///
    /// The caller must [restart](XmlStream::restart) the stream afterwards.
    pub async fn starttls(self, upgrade: &dyn TlsUpgrade) -> Result<XmlStream, TransportError> {
        let stream = upgrade.upgrade(self.stream, &self.domain).await?;
        Ok(XmlStream {
            stream,
            inbound: Inbound::new(),
            domain: self.domain,
            stream_id: None,
        })
    }

    /// Closes the stream from our side and shuts the socket down.
    pub async fn close(mut self) -> Result<(), TransportError> {
        write_str(&mut self.stream, STREAM_END).await?;
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Splits the established stream between a reader and a writer task.
    pub fn into_split(self) -> (StreamReader, StreamWriter) {
        let (reader, writer) = tokio::io::split(self.stream);
        (
            StreamReader {
                reader,
                inbound: self.inbound,
            },
            StreamWriter { writer },
        )
    }
}

/// Receiving side of an established stream.
pub struct StreamReader {
    reader: ReadHalf<BoxedStream>,
    inbound: Inbound,
}

impl StreamReader {
    /// Waits for the next stanza or other top level element.
    ///
    /// This is cancel safe, a partially received element stays buffered.
    pub async fn next_element(&mut self) -> Result<Element, TransportError> {
        let element = self.inbound.next(&mut self.reader).await?;
        stanza_level(element)
    }
}

/// Sending side of an established stream.
pub struct StreamWriter {
    writer: WriteHalf<BoxedStream>,
}

impl StreamWriter {
    pub async fn send_element(&mut self, element: &Element) -> Result<(), TransportError> {
        write_str(&mut self.writer, &element.to_string()).await
    }

    pub async fn close(mut self) -> Result<(), TransportError> {
        write_str(&mut self.writer, STREAM_END).await?;
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
