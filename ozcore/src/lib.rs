pub use ozcore_xml;

pub mod command;
pub mod error;
pub mod event;
pub mod message;
pub mod namespace;
pub mod request;
pub mod xml;

pub use command::Command;
pub use error::{CommandError, EventError};
pub use event::Event;
pub use message::{CommandKind, Correlation, Message};
