use async_trait::async_trait;
use log::trace;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// A serialized command ready to leave the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundStanza {
    /// `call` or `call/command` for sub-actions.
    pub target: String,
    pub call_id: String,
    pub command_id: String,
    pub xml: String,
}

/// What a transport reports back to the client loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    /// An inbound document with the correlation ids from its envelope.
    /// Offers carry the new call's id and an empty command id.
    StanzaReceived {
        call_id: String,
        command_id: String,
        xml: String,
    },
    Disconnected,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one stanza. Called exactly once per issued command.
    async fn send(&self, stanza: &OutboundStanza) -> Result<(), anyhow::Error>;

    async fn disconnect(&self);
}

/// In-process transport that hands every outbound stanza to a channel.
///
/// The receiving half plays the part of the server, which makes this the
/// transport of choice for the demo binary and for tests.
pub struct ChannelTransport {
    outbound: mpsc::Sender<OutboundStanza>,
    closed: AtomicBool,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<OutboundStanza>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                outbound,
                closed: AtomicBool::new(false),
            },
            rx,
        )
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, stanza: &OutboundStanza) -> Result<(), anyhow::Error> {
        if self.closed.load(Ordering::Acquire) {
            anyhow::bail!("transport is disconnected");
        }
        trace!(target: "Transport/Channel", "--> {} {}", stanza.target, stanza.xml);
        self.outbound
            .send(stanza.clone())
            .await
            .map_err(|_| anyhow::anyhow!("outbound channel closed"))
    }

    async fn disconnect(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// A transport whose every send fails.
    pub struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn send(&self, _stanza: &OutboundStanza) -> Result<(), anyhow::Error> {
            Err(anyhow::anyhow!("connection reset"))
        }

        async fn disconnect(&self) {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stanza() -> OutboundStanza {
        OutboundStanza {
            target: "c1".into(),
            call_id: "c1".into(),
            command_id: "ab-0".into(),
            xml: r#"<answer xmlns="urn:xmpp:ozone:1"/>"#.into(),
        }
    }

    #[tokio::test]
    async fn forwards_to_receiver() {
        let (transport, mut rx) = ChannelTransport::new(4);
        transport.send(&stanza()).await.unwrap();
        assert_eq!(rx.recv().await, Some(stanza()));
    }

    #[tokio::test]
    async fn send_after_disconnect_fails() {
        let (transport, _rx) = ChannelTransport::new(4);
        transport.disconnect().await;
        assert!(transport.send(&stanza()).await.is_err());
    }

    #[tokio::test]
    async fn send_with_dropped_receiver_fails() {
        let (transport, rx) = ChannelTransport::new(4);
        drop(rx);
        assert!(transport.send(&stanza()).await.is_err());
    }
}
