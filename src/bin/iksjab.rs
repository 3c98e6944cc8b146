/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use iksjab::ClientConfig;
use iksjab::Event;
use iksjab::Jid;
use iksjab::XmppClient;
use iksjab::xmpp::StanzaAttributes;

/// This tool can communicate over XMPP.
#[derive(Parser)]
#[command(name = "iksjab", version, about, long_about = None)]
#[command(after_help = "Report issues at https://github.com/meduketto/iksemel-rust/issues")]
struct Cli {
    /// Jabber ID
    #[arg(short, long)]
    jid: Option<Jid>,

    /// Server host, if different from the JID domain
    #[arg(short, long)]
    server: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resource to bind
    #[arg(short, long)]
    resource: Option<String>,

    /// Log the raw XML traffic
    #[arg(short, long)]
    debug: bool,

    /// Send a chat message to this JID
    #[arg(long, requires = "message")]
    send_to: Option<Jid>,

    /// Text of the message
    #[arg(short, long)]
    message: Option<String>,

    /// Ping this JID and print the round trip time
    #[arg(long)]
    ping: Option<Jid>,
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match (&cli.config, &cli.jid) {
        (Some(path), _) => ClientConfig::load(path)
            .with_context(|| format!("cannot load {}", path.display()))?,
        (None, Some(jid)) => ClientConfig::builder(jid.clone()).build()?,
        (None, None) => bail!("either --jid or --config is required"),
    };
    if let Some(jid) = &cli.jid {
        config.jid = jid.clone();
    }
    if let Some(server) = &cli.server {
        config.server = Some(server.clone());
    }
    if let Some(resource) = &cli.resource {
        config.resource = Some(resource.clone());
    }
    if config.password.is_none() {
        let password = rpassword::prompt_password(format!("Password for {}: ", config.jid))?;
        config.password = Some(password);
    }
    Ok(config)
}

fn print_event(event: &Event) {
    match event {
        Event::Message(message) => {
            if let Some(body) = message.body() {
                match message.from() {
                    Some(from) => println!("{from}: {body}"),
                    None => println!("{body}"),
                }
            }
        }
        Event::SubscriptionRequest(jid) => println!("{jid} wants to subscribe to your presence"),
        Event::SubscriptionApproved(jid) => println!("{jid} approved your subscription"),
        Event::SubscriptionRefused(jid) => println!("{jid} refused your subscription"),
        Event::Unsubscribed(jid) => println!("{jid} unsubscribed from your presence"),
        Event::RoomInvite(invite) => println!("invited to {}", invite.room),
        Event::Attention { from, message } => match message {
            Some(message) => println!("{from} wants your attention: {message}"),
            None => println!("{from} wants your attention"),
        },
        Event::Error { from, error } => match from {
            Some(from) => println!("error from {from}: {error}"),
            None => println!("error: {error}"),
        },
        _ => (),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "iksjab=debug,iksjab::wire=trace"
    } else {
        "iksjab=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let client = XmppClient::new(config)?;
    let mut events = client
        .take_events()
        .context("event receiver already taken")?;

    let roster = client.connect(None).await.context("cannot connect")?;
    if let Some(jid) = client.current_jid() {
        println!("connected as {jid}");
    }
    for item in &roster {
        match &item.name {
            Some(name) => println!("  {} ({name}) [{}]", item.jid, item.subscription),
            None => println!("  {} [{}]", item.jid, item.subscription),
        }
    }

    if let (Some(to), Some(message)) = (&cli.send_to, &cli.message) {
        client.send_chat(to, message).await?;
    }
    if let Some(jid) = &cli.ping {
        let rtt = client.ping(jid).await?;
        println!("pong from {jid} in {} ms", rtt.as_millis());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(Event::Disconnected(reason)) => {
                    if let Some(reason) = reason {
                        eprintln!("disconnected: {reason}");
                    }
                    return Ok(());
                }
                Some(event) => print_event(&event),
                None => break,
            },
        }
    }
    client.close().await;
    Ok(())
}
