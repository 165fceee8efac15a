use chrono::Local;
use clap::Parser;
use log::{error, info};
use ozone_rust::command::{AskOptions, Command, HeaderOptions, SayOptions};
use ozone_rust::{ChannelTransport, Client, ClientConfig, Event, OutboundStanza, TransportEvent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// Plays a scripted call against an in-process fake server:
// offer, answer, say (paused then stopped), ask, hangup.
//
// Usage:
//   cargo run
//   cargo run -- --call-id 9f00061 --timeout-ms 500
//   cargo run -- --config client.json

#[derive(Parser, Debug)]
#[command(about = "Scripted loopback call over the Ozone message model")]
struct Args {
    /// Id the fake server assigns to the offered call.
    #[arg(long, default_value = "9f00061")]
    call_id: String,

    /// Per-command timeout; overrides the config default.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// JSON client config.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{:<5}] [{}] - {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = Args::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to build tokio runtime: {e}");
            return;
        }
    };

    rt.block_on(async {
        if let Err(e) = run(args).await {
            error!("Demo call failed: {e:#}");
        }
    });
}

async fn run(args: Args) -> Result<(), anyhow::Error> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_json_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(ms) = args.timeout_ms {
        config.default_timeout = Duration::from_millis(ms);
    }

    let (transport, outbound) = ChannelTransport::new(16);
    let (events_tx, events_rx) = mpsc::channel(16);
    let (client, mut new_calls) = Client::new(Arc::new(transport), config);

    tokio::spawn(client.clone().run(events_rx));
    tokio::spawn(fake_server(args.call_id.clone(), outbound, events_tx));

    let call = new_calls
        .recv()
        .await
        .ok_or_else(|| anyhow::anyhow!("server closed before offering a call"))?;
    info!("Offered call: {}", serde_json::to_string(&call)?);

    let answer = Command::Answer(HeaderOptions::default()).build(call.correlation())?;
    log_event("answer", &client.execute(answer, None).await?)?;

    // The say keeps running while we pause and stop it, so give it an id up
    // front that its sub-actions can target.
    let say = Command::Say(SayOptions::text("Welcome to the demo.").with_voice("allison"))
        .build(call.correlation())?
        .with_command_id(client.generate_command_id());
    let say_pending = client.issue(say.clone()).await?;
    log_event("pause", &client.execute(say.pause()?, None).await?)?;
    log_event("stop", &client.execute(say.stop()?, None).await?)?;
    log_event("say", &say_pending.wait(client.config().default_timeout).await?)?;

    let ask = Command::Ask(
        AskOptions::new("Please enter your four digit pin", "[4 DIGITS]")
            .with_timeout(Duration::from_secs(30)),
    )
    .build(call.correlation())?;
    let result = client.execute(ask, None).await?;
    if let Some(pin) = result.headers().and_then(|h| h.get("interpretation")) {
        info!("Caller entered {pin}");
    }

    let hangup = Command::Hangup(HeaderOptions::default()).build(call.correlation())?;
    log_event("hangup", &client.execute(hangup, None).await?)?;

    // Let the trailing end event drain through the client loop.
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.disconnect().await;
    Ok(())
}

fn log_event(command: &str, event: &Event) -> Result<(), anyhow::Error> {
    info!("{command} -> {}", serde_json::to_string(event)?);
    Ok(())
}

/// Answers every command the way a media server would, with canned events.
async fn fake_server(
    call_id: String,
    mut outbound: mpsc::Receiver<OutboundStanza>,
    events: mpsc::Sender<TransportEvent>,
) {
    let reply = |command_id: &str, xml: &str| TransportEvent::StanzaReceived {
        call_id: call_id.clone(),
        command_id: command_id.to_string(),
        xml: xml.to_string(),
    };

    let offer = r#"<offer xmlns="urn:xmpp:ozone:1" to="tel:+18003211212" from="tel:+13058881212">
        <header name="x-skill" value="agent"/>
    </offer>"#;
    if events.send(TransportEvent::Connected).await.is_err()
        || events.send(reply("", offer)).await.is_err()
    {
        return;
    }

    while let Some(stanza) = outbound.recv().await {
        let tag = match ozcore_xml::unmarshal(&stanza.xml) {
            Ok(node) => node.tag,
            Err(e) => {
                error!(target: "Server", "Unreadable command: {e}");
                continue;
            }
        };

        let mut replies = Vec::new();
        match tag.as_str() {
            "ask" => replies.push(reply(
                &stanza.command_id,
                r#"<complete xmlns="urn:xmpp:ozone:ask:1"><success/><header name="interpretation" value="1234"/></complete>"#,
            )),
            // The say itself has been running; it completes once stopped.
            "say" => continue,
            "stop" => {
                replies.push(reply(&stanza.command_id, "<complete><success/></complete>"));
                if let Some((_, say_id)) = stanza.target.split_once('/') {
                    replies.push(reply(say_id, "<complete><stop/></complete>"));
                }
            }
            "hangup" => {
                replies.push(reply(&stanza.command_id, "<complete><success/></complete>"));
                replies.push(reply("", "<end><hangup-command/></end>"));
            }
            _ => replies.push(reply(&stanza.command_id, "<complete><success/></complete>")),
        }

        for event in replies {
            if events.send(event).await.is_err() {
                return;
            }
        }
    }

    let _ = events.send(TransportEvent::Disconnected).await;
}
