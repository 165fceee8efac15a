//! Call-level commands that live directly under the base namespace.

use super::{HEADER_PREFIX, header_nodes};
use crate::command::options::OptionReader;
use crate::error::CommandError;
use ozcore_xml::builder::NodeBuilder;
use ozcore_xml::node::Node;

/// Options shared by accept, answer and hangup: only signaling headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderOptions {
    pub headers: Vec<(String, String)>,
}

impl HeaderOptions {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub(crate) fn from_reader(reader: &mut OptionReader) -> Self {
        Self {
            headers: reader.take_prefixed(HEADER_PREFIX),
        }
    }

    pub(crate) fn children(&self) -> Vec<Node> {
        header_nodes(&self.headers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectReason {
    Busy,
    #[default]
    Decline,
    Error,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Busy => "busy",
            RejectReason::Decline => "decline",
            RejectReason::Error => "error",
        }
    }
}

impl std::str::FromStr for RejectReason {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "busy" => Ok(RejectReason::Busy),
            "decline" => Ok(RejectReason::Decline),
            "error" => Ok(RejectReason::Error),
            other => Err(CommandError::InvalidOption {
                key: "reason".to_string(),
                reason: format!("'{other}' is not one of busy, decline, error"),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectOptions {
    pub reason: RejectReason,
    pub headers: Vec<(String, String)>,
}

impl RejectOptions {
    pub fn new(reason: RejectReason) -> Self {
        Self {
            reason,
            headers: Vec::new(),
        }
    }

    pub(crate) fn from_reader(reader: &mut OptionReader) -> Result<Self, CommandError> {
        let reason = match reader.take("reason") {
            Some(value) => value.parse()?,
            None => RejectReason::default(),
        };
        Ok(Self {
            reason,
            headers: reader.take_prefixed(HEADER_PREFIX),
        })
    }

    pub(crate) fn children(&self) -> Vec<Node> {
        let mut children = vec![NodeBuilder::new(self.reason.as_str()).build()];
        children.extend(header_nodes(&self.headers));
        children
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectOptions {
    pub to: String,
    pub headers: Vec<(String, String)>,
}

impl RedirectOptions {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            headers: Vec::new(),
        }
    }

    pub(crate) fn from_reader(reader: &mut OptionReader) -> Result<Self, CommandError> {
        Ok(Self {
            to: reader.require("to")?,
            headers: reader.take_prefixed(HEADER_PREFIX),
        })
    }

    pub(crate) fn validate(&self) -> Result<(), CommandError> {
        if self.to.trim().is_empty() {
            return Err(CommandError::MissingOption {
                kind: "redirect",
                key: "to",
            });
        }
        Ok(())
    }
}
