/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::DuplexStream;

use super::*;
use crate::xmpp::StreamError;

const SERVER_HEADER: &str = "<?xml version='1.0'?><stream:stream \
                             xmlns='jabber:client' \
                             xmlns:stream='http://etherx.jabber.org/streams' \
                             id='abc' from='example.com' version='1.0'>";

fn pair() -> (XmlStream, DuplexStream) {
    let (client, server) = tokio::io::duplex(8192);
    (XmlStream::new(Box::new(client), "example.com"), server)
}

async fn read_until(server: &mut DuplexStream, needle: &str) -> String {
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    while !String::from_utf8_lossy(&received).contains(needle) {
        let nr = server.read(&mut buf).await.unwrap();
        assert!(nr > 0, "client closed before sending {needle}");
        received.extend_from_slice(&buf[..nr]);
    }
    String::from_utf8(received).unwrap()
}

#[tokio::test]
async fn open_and_exchange() {
    let (mut stream, mut server) = pair();
    server.write_all(SERVER_HEADER.as_bytes()).await.unwrap();

    let header = stream.open().await.unwrap();
    assert_eq!(header.attribute("from"), Some("example.com"));
    assert_eq!(stream.stream_id(), Some("abc"));

    let sent = read_until(&mut server, "version='1.0' to='example.com'>").await;
    assert!(sent.starts_with("<?xml version='1.0'?><stream:stream xmlns='jabber:client'"));

    server
        .write_all(b"<stream:features><bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/></stream:features>")
        .await
        .unwrap();
    let features = stream.next_element().await.unwrap();
    assert_eq!(features.name(), "stream:features");
    assert!(features.find_tag_ns("bind", "urn:ietf:params:xml:ns:xmpp-bind").is_some());

    stream
        .send_element(&Element::new("presence"))
        .await
        .unwrap();
    assert_eq!(read_until(&mut server, "<presence/>").await, "<presence/>");
}

#[tokio::test]
async fn restart_sends_new_header() {
    let (mut stream, mut server) = pair();
    server.write_all(SERVER_HEADER.as_bytes()).await.unwrap();
    stream.open().await.unwrap();
    read_until(&mut server, "to='example.com'>").await;

    server.write_all(SERVER_HEADER.as_bytes()).await.unwrap();
    stream.restart().await.unwrap();
    let sent = read_until(&mut server, "to='example.com'>").await;
    assert_eq!(sent.matches("<stream:stream").count(), 1);
}

#[tokio::test]
async fn stream_errors() {
    let (mut stream, mut server) = pair();
    server.write_all(SERVER_HEADER.as_bytes()).await.unwrap();
    server
        .write_all(
            b"<stream:error><host-unknown xmlns='urn:ietf:params:xml:ns:xmpp-streams'/>\
              <text xmlns='urn:ietf:params:xml:ns:xmpp-streams'>no</text></stream:error>",
        )
        .await
        .unwrap();
    stream.open().await.unwrap();
    match stream.next_element().await {
        Err(TransportError::StreamError(condition)) => assert_eq!(condition, "host-unknown"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn stream_end_and_eof() {
    let (mut stream, mut server) = pair();
    server.write_all(SERVER_HEADER.as_bytes()).await.unwrap();
    server.write_all(b"</stream:stream>").await.unwrap();
    stream.open().await.unwrap();
    assert!(matches!(
        stream.next_element().await,
        Err(TransportError::StreamClosed)
    ));

    let (mut stream, mut server) = pair();
    server.write_all(SERVER_HEADER.as_bytes()).await.unwrap();
    server.write_all(b"<message><bo").await.unwrap();
    stream.open().await.unwrap();
    drop(server);
    assert!(matches!(
        stream.next_element().await,
        Err(TransportError::UnexpectedEof)
    ));
}

#[tokio::test]
async fn bad_headers() {
    let (mut stream, mut server) = pair();
    server
        .write_all(b"<stream:stream xmlns:stream='jabber:wrong' version='1.0'>")
        .await
        .unwrap();
    assert!(matches!(
        stream.open().await,
        Err(TransportError::BadStream(description::HEADER_NAMESPACE))
    ));

    let (mut stream, mut server) = pair();
    server
        .write_all(b"<stream:stream xmlns:stream='http://etherx.jabber.org/streams'>")
        .await
        .unwrap();
    assert!(matches!(
        stream.open().await,
        Err(TransportError::BadStream(description::HEADER_VERSION))
    ));

    let (mut stream, mut server) = pair();
    server.write_all(b"<html><body/></html>").await.unwrap();
    assert!(matches!(
        stream.open().await,
        Err(TransportError::MalformedXml(StreamError::BadStream(_)))
    ));
}

#[tokio::test]
async fn split_halves() {
    let (mut stream, mut server) = pair();
    server.write_all(SERVER_HEADER.as_bytes()).await.unwrap();
    server
        .write_all(b"<message from='a@example.com'><body>one</body></message><presence/>")
        .await
        .unwrap();
    stream.open().await.unwrap();
    read_until(&mut server, "to='example.com'>").await;

    let first = stream.next_element().await.unwrap();
    assert_eq!(first.child_text("body"), Some("one".to_string()));

    let (mut reader, mut writer) = stream.into_split();
    assert_eq!(reader.next_element().await.unwrap().name(), "presence");

    writer
        .send_element(&Element::new("iq").with_attribute("id", "1"))
        .await
        .unwrap();
    assert_eq!(
        read_until(&mut server, "/>").await,
        "<iq id=\"1\"/>"
    );
    writer.close().await.unwrap();
    assert_eq!(
        read_until(&mut server, "</stream:stream>").await,
        "</stream:stream>"
    );
}
