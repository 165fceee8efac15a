// Message model and event parsing live in ozcore; this crate adds the runtime.
pub use ozcore::{command, event, message, namespace};
pub use ozcore::{Command, CommandError, CommandKind, Correlation, Event, EventError, Message};

pub mod call;
pub mod client;
pub mod config;
pub mod correlator;
pub mod transport;

pub use call::CallContext;
pub use client::{Client, ClientError, Inbound};
pub use config::ClientConfig;
pub use correlator::{CorrelationError, CorrelationKey, Correlator, PendingCommand};
pub use transport::{ChannelTransport, OutboundStanza, Transport, TransportEvent};
