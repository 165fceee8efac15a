use ozcore_xml::XmlError;
use thiserror::Error;

/// Errors raised while building an outbound command.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    #[error("unsupported command kind: '{0}'")]
    UnsupportedCommand(String),

    #[error("unknown option '{key}' for {kind}")]
    UnknownOption { kind: &'static str, key: String },

    #[error("missing required option '{key}' for {kind}")]
    MissingOption { kind: &'static str, key: &'static str },

    #[error("invalid value for option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("{action} cannot be issued on a {family} message")]
    InvalidSubAction {
        action: &'static str,
        family: &'static str,
    },

    #[error("{action} needs the command id of the running {family}")]
    UnaddressedSubAction {
        action: &'static str,
        family: &'static str,
    },

    #[error("failed to serialize command: {0}")]
    Xml(#[from] XmlError),
}

/// Errors raised while classifying an inbound document.
#[derive(Debug, Clone, Error)]
pub enum EventError {
    #[error("malformed document: {0}")]
    Malformed(#[from] XmlError),

    #[error("protocol error on call {call_id} (command {command_id}): {condition}")]
    Protocol {
        call_id: String,
        command_id: String,
        condition: String,
    },
}

impl EventError {
    pub fn is_protocol(&self) -> bool {
        matches!(self, EventError::Protocol { .. })
    }
}
