use crate::call::CallContext;
use crate::config::ClientConfig;
use crate::correlator::{CorrelationError, CorrelationKey, Correlator, PendingCommand};
use crate::transport::{OutboundStanza, Transport, TransportEvent};
use log::{debug, info, warn};
use ozcore::error::{CommandError, EventError};
use ozcore::event::Event;
use ozcore::message::{CommandKind, Message};
use ozcore::request::CommandIdGenerator;
use ozcore::xml::DisplayableNode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0} command has no call id")]
    MissingCallId(CommandKind),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Correlation(#[from] CorrelationError),
    #[error(transparent)]
    Event(#[from] EventError),
}

/// How an inbound document was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// An offer, forwarded on the new-call channel.
    NewCall,
    /// An offer discarded because the new-call channel was full or closed.
    Dropped,
    /// Completed a pending command.
    Delivered,
    /// A valid event nobody was waiting for.
    Unmatched,
    /// Not an event document.
    Ignored,
}

pub struct Client {
    transport: Arc<dyn Transport>,
    correlator: Correlator,
    ids: CommandIdGenerator,
    config: ClientConfig,
    new_calls: mpsc::Sender<CallContext>,
}

impl Client {
    /// Creates a client and the receiver on which offered calls arrive.
    pub fn new(
        transport: Arc<dyn Transport>,
        config: ClientConfig,
    ) -> (Arc<Self>, mpsc::Receiver<CallContext>) {
        let (new_calls, new_calls_rx) = mpsc::channel(config.new_call_capacity.max(1));
        let ids = match &config.command_id_prefix {
            Some(prefix) => CommandIdGenerator::new(prefix.clone()),
            None => CommandIdGenerator::random(),
        };
        let client = Arc::new(Self {
            transport,
            correlator: Correlator::new(),
            ids,
            config,
            new_calls,
        });
        (client, new_calls_rx)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    pub fn generate_command_id(&self) -> String {
        self.ids.generate_command_id()
    }

    /// Sends a command and returns the handle to await its response.
    ///
    /// The message must carry a call id. A command id is generated unless
    /// the message already has one. The waiter is registered before the
    /// send, so a response cannot overtake its registration.
    pub async fn issue(&self, message: Message) -> Result<PendingCommand, ClientError> {
        let call_id = message
            .call_id()
            .ok_or(ClientError::MissingCallId(message.kind()))?
            .to_string();
        let message = match message.command_id() {
            Some(_) => message,
            None => message.with_command_id(self.generate_command_id()),
        };
        let command_id = message.command_id().unwrap_or_default().to_string();
        let target = message.target().unwrap_or_else(|| call_id.clone());

        let stanza = OutboundStanza {
            xml: message.to_xml()?,
            target,
            call_id: call_id.clone(),
            command_id: command_id.clone(),
        };

        let pending = self
            .correlator
            .register(CorrelationKey::new(call_id, command_id))?;

        debug!(
            target: "Client/Command",
            "--> [{}] {}",
            pending.key(),
            DisplayableNode(message.node())
        );

        if let Err(e) = self.transport.send(&stanza).await {
            drop(pending);
            return Err(ClientError::Transport(e.to_string()));
        }
        Ok(pending)
    }

    /// Issues a command and waits for its response.
    ///
    /// Falls back to the configured default timeout when `timeout` is `None`.
    pub async fn execute(
        &self,
        message: Message,
        timeout: Option<Duration>,
    ) -> Result<Event, ClientError> {
        let pending = self.issue(message).await?;
        let event = pending
            .wait(timeout.unwrap_or(self.config.default_timeout))
            .await?;
        Ok(event)
    }

    /// Classifies an inbound document and routes it.
    ///
    /// Malformed documents and protocol errors are returned to the caller;
    /// a protocol error also fails the command it names. Any `end`, with or
    /// without an error, cancels the commands still pending on its call.
    /// Offers never wait for room on the new-call channel.
    pub async fn handle_inbound(
        &self,
        call_id: &str,
        command_id: &str,
        xml: &str,
    ) -> Result<Inbound, ClientError> {
        let event = match Event::parse_document(call_id, command_id, xml) {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!(target: "Client/Inbound", "Ignoring non-event document on call {call_id}");
                return Ok(Inbound::Ignored);
            }
            Err(error) => {
                if error.is_protocol() {
                    let key = CorrelationKey::new(call_id, command_id);
                    if !self.correlator.fail(&key, error.clone()) {
                        warn!(target: "Client/Inbound", "Unmatched protocol error: {error}");
                    }
                    // An error end still ends the call.
                    self.correlator.cancel_call(call_id);
                }
                return Err(error.into());
            }
        };

        match event {
            Event::Offer(offer) => {
                let call = CallContext::from_offer(call_id, offer);
                info!(target: "Client/Inbound", "New call {} to {}", call.call_id, call.to);
                // Never wait on the application here; responses queue behind offers.
                match self.new_calls.try_send(call) {
                    Ok(()) => Ok(Inbound::NewCall),
                    Err(TrySendError::Full(_)) => {
                        warn!(target: "Client/Inbound", "New-call channel full; offer for {call_id} dropped");
                        Ok(Inbound::Dropped)
                    }
                    Err(TrySendError::Closed(_)) => {
                        warn!(target: "Client/Inbound", "New-call receiver dropped; offer for {call_id} dropped");
                        Ok(Inbound::Dropped)
                    }
                }
            }
            event => {
                let ends_call = matches!(event, Event::End(_));
                let delivered = self.correlator.deliver(event);
                if ends_call {
                    self.correlator.cancel_call(call_id);
                }
                if delivered {
                    return Ok(Inbound::Delivered);
                }
                debug!(target: "Client/Inbound", "No waiter for {call_id}/{command_id}");
                Ok(Inbound::Unmatched)
            }
        }
    }

    /// Drains transport events until the transport disconnects.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Connected => info!(target: "Client", "Transport connected"),
                TransportEvent::StanzaReceived {
                    call_id,
                    command_id,
                    xml,
                } => {
                    if let Err(e) = self.handle_inbound(&call_id, &command_id, &xml).await {
                        warn!(target: "Client/Inbound", "Failed to handle stanza on call {call_id}: {e}");
                    }
                }
                TransportEvent::Disconnected => break,
            }
        }

        let cancelled = self.correlator.cancel_all();
        info!(target: "Client", "Transport disconnected, cancelled {cancelled} pending command(s)");
    }

    pub async fn disconnect(&self) {
        self.transport.disconnect().await;
        self.correlator.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ChannelTransport;
    use crate::transport::mock::FailingTransport;
    use ozcore::command::{Command, HeaderOptions, SayOptions};
    use ozcore::message::Correlation;

    fn config() -> ClientConfig {
        ClientConfig {
            command_id_prefix: Some("t".into()),
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn issue_assigns_id_and_sends_once() {
        let (transport, mut outbound) = ChannelTransport::new(4);
        let (client, _calls) = Client::new(Arc::new(transport), config());

        let answer = Command::Answer(HeaderOptions::default())
            .build(Correlation::call("c1"))
            .unwrap();
        let pending = client.issue(answer).await.unwrap();

        assert_eq!(pending.command_id(), "t-0");
        let sent = outbound.recv().await.unwrap();
        assert_eq!(sent.target, "c1");
        assert_eq!(sent.command_id, "t-0");
        assert_eq!(sent.xml, r#"<answer xmlns="urn:xmpp:ozone:1"/>"#);
        assert!(outbound.try_recv().is_err());
        assert!(client.correlator().is_pending(pending.key()));
    }

    #[tokio::test]
    async fn issue_without_call_id_fails() {
        let (transport, _outbound) = ChannelTransport::new(4);
        let (client, _calls) = Client::new(Arc::new(transport), config());

        let hangup = Command::Hangup(HeaderOptions::default())
            .build(Correlation::default())
            .unwrap();
        let err = client.issue(hangup).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingCallId(CommandKind::Hangup)));
        assert_eq!(client.correlator().pending_count(), 0);
    }

    #[tokio::test]
    async fn failed_send_removes_registration() {
        let (client, _calls) = Client::new(Arc::new(FailingTransport), config());
        let say = Command::Say(SayOptions::text("hi"))
            .build(Correlation::call("c1"))
            .unwrap();

        let err = client.issue(say).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(msg) if msg == "connection reset"));
        assert_eq!(client.correlator().pending_count(), 0);
    }

    #[tokio::test]
    async fn inbound_complete_reaches_waiter() {
        let (transport, _outbound) = ChannelTransport::new(4);
        let (client, _calls) = Client::new(Arc::new(transport), config());
        let answer = Command::Answer(HeaderOptions::default())
            .build(Correlation::call("c1"))
            .unwrap();
        let pending = client.issue(answer).await.unwrap();

        let routed = client
            .handle_inbound("c1", "t-0", r#"<complete xmlns="urn:xmpp:ozone:1"><success/></complete>"#)
            .await
            .unwrap();
        assert_eq!(routed, Inbound::Delivered);

        let event = pending.wait(Duration::from_secs(1)).await.unwrap();
        assert!(matches!(event, Event::Complete(c) if c.reason.as_deref() == Some("success")));
    }

    #[tokio::test]
    async fn offer_goes_to_new_call_channel() {
        let (transport, _outbound) = ChannelTransport::new(4);
        let (client, mut calls) = Client::new(Arc::new(transport), config());

        let routed = client
            .handle_inbound(
                "c9",
                "",
                r#"<offer to="tel:+1800" from="tel:+1305"><header name="x-id" value="42"/></offer>"#,
            )
            .await
            .unwrap();
        assert_eq!(routed, Inbound::NewCall);

        let call = calls.recv().await.unwrap();
        assert_eq!(call.call_id, "c9");
        assert_eq!(call.from.as_deref(), Some("tel:+1305"));
        assert_eq!(call.header("x-id"), Some("42"));
    }

    #[tokio::test]
    async fn protocol_error_fails_waiter() {
        let (transport, _outbound) = ChannelTransport::new(4);
        let (client, _calls) = Client::new(Arc::new(transport), config());
        let say = Command::Say(SayOptions::text("hi"))
            .build(Correlation::call("c1"))
            .unwrap();
        let pending = client.issue(say).await.unwrap();

        let err = client
            .handle_inbound("c1", "t-0", "<end><error>boom</error></end>")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Event(e) if e.is_protocol()));

        let err = pending.wait(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, CorrelationError::Failed(_)));
    }

    #[tokio::test]
    async fn unmatched_end_cancels_the_call() {
        let (transport, _outbound) = ChannelTransport::new(4);
        let (client, _calls) = Client::new(Arc::new(transport), config());
        let say = Command::Say(SayOptions::text("hi"))
            .build(Correlation::call("c1"))
            .unwrap();
        let pending = client.issue(say).await.unwrap();

        let routed = client
            .handle_inbound("c1", "", "<end><hangup/></end>")
            .await
            .unwrap();
        assert_eq!(routed, Inbound::Unmatched);
        assert!(matches!(
            pending.wait(Duration::from_secs(1)).await,
            Err(CorrelationError::Cancelled(_))
        ));
    }

    #[tokio::test]
    async fn error_end_cancels_other_commands_on_the_call() {
        let (transport, _outbound) = ChannelTransport::new(4);
        let (client, _calls) = Client::new(Arc::new(transport), config());
        let say = Command::Say(SayOptions::text("hi"))
            .build(Correlation::call("c1"))
            .unwrap();
        let pending = client.issue(say).await.unwrap();
        let other_call = client
            .issue(
                Command::Answer(HeaderOptions::default())
                    .build(Correlation::call("c2"))
                    .unwrap(),
            )
            .await
            .unwrap();

        let err = client
            .handle_inbound("c1", "unrelated", "<end><error/></end>")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Event(e) if e.is_protocol()));

        assert!(matches!(
            pending.wait(Duration::from_secs(1)).await,
            Err(CorrelationError::Cancelled(_))
        ));
        assert!(client.correlator().is_pending(other_call.key()));
    }

    #[tokio::test]
    async fn full_new_call_channel_drops_the_offer() {
        let (transport, _outbound) = ChannelTransport::new(4);
        let config = ClientConfig {
            new_call_capacity: 1,
            ..config()
        };
        let (client, mut calls) = Client::new(Arc::new(transport), config);

        let offer = r#"<offer to="tel:+1800"/>"#;
        assert_eq!(
            client.handle_inbound("c1", "", offer).await.unwrap(),
            Inbound::NewCall
        );
        assert_eq!(
            client.handle_inbound("c2", "", offer).await.unwrap(),
            Inbound::Dropped
        );

        assert_eq!(calls.recv().await.unwrap().call_id, "c1");
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_event_documents_are_ignored() {
        let (transport, _outbound) = ChannelTransport::new(4);
        let (client, _calls) = Client::new(Arc::new(transport), config());
        assert_eq!(
            client.handle_inbound("c1", "1", "<presence/>").await.unwrap(),
            Inbound::Ignored
        );
        assert!(matches!(
            client.handle_inbound("c1", "1", "<info").await,
            Err(ClientError::Event(EventError::Malformed(_)))
        ));
    }
}
