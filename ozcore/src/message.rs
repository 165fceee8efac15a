//! The outbound message model shared by every command.

use crate::error::CommandError;
use crate::namespace::namespace_for;
use ozcore_xml::node::{Attrs, Node, NodeContent};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Every command the client knows how to build.
///
/// Sub-actions (`Pause`, `Mute`, ...) are their own kinds but belong to the
/// family of the command that spawned them, which decides their namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Accept,
    Answer,
    Hangup,
    Reject,
    Redirect,
    Ask,
    Say,
    Pause,
    Resume,
    Stop,
    Conference,
    Mute,
    Unmute,
    Kick,
    Transfer,
}

impl CommandKind {
    pub const ALL: [CommandKind; 15] = [
        Self::Accept,
        Self::Answer,
        Self::Hangup,
        Self::Reject,
        Self::Redirect,
        Self::Ask,
        Self::Say,
        Self::Pause,
        Self::Resume,
        Self::Stop,
        Self::Conference,
        Self::Mute,
        Self::Unmute,
        Self::Kick,
        Self::Transfer,
    ];

    /// Element name on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Answer => "answer",
            Self::Hangup => "hangup",
            Self::Reject => "reject",
            Self::Redirect => "redirect",
            Self::Ask => "ask",
            Self::Say => "say",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Conference => "conference",
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::Kick => "kick",
            Self::Transfer => "transfer",
        }
    }

    /// The family this kind is scoped under.
    pub fn family(&self) -> CommandKind {
        match self {
            Self::Pause | Self::Resume | Self::Stop => Self::Say,
            Self::Mute | Self::Unmute | Self::Kick => Self::Conference,
            other => *other,
        }
    }

    pub fn is_sub_action(&self) -> bool {
        self.family() != *self
    }

    pub fn namespace(&self) -> String {
        namespace_for(self.family().tag())
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for CommandKind {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| CommandError::UnsupportedCommand(s.to_string()))
    }
}

/// The `(call id, command id)` pair used to match a command to its response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Correlation {
    pub call_id: Option<String>,
    pub command_id: Option<String>,
}

impl Correlation {
    pub fn call(call_id: impl Into<String>) -> Self {
        Self {
            call_id: Some(call_id.into()),
            command_id: None,
        }
    }

    pub fn new(call_id: impl Into<String>, command_id: impl Into<String>) -> Self {
        Self {
            call_id: Some(call_id.into()),
            command_id: Some(command_id.into()),
        }
    }
}

/// A fully assembled outbound command.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    kind: CommandKind,
    node: Node,
    correlation: Correlation,
    parent: Option<Correlation>,
}

impl Message {
    /// Builds a message for a kind given by name. Unknown names fail with
    /// [`CommandError::UnsupportedCommand`].
    pub fn construct(
        kind: &str,
        attrs: Attrs,
        children: Vec<Node>,
        correlation: Correlation,
    ) -> Result<Self, CommandError> {
        let kind: CommandKind = kind.parse()?;
        let content = if children.is_empty() {
            None
        } else {
            Some(NodeContent::Nodes(children))
        };
        Ok(Self::from_parts(kind, attrs, content, correlation))
    }

    /// Assembles the root element. The namespace is derived from the kind's
    /// family on every construction and always overrides a caller `xmlns`.
    pub(crate) fn from_parts(
        kind: CommandKind,
        attrs: Attrs,
        content: Option<NodeContent>,
        correlation: Correlation,
    ) -> Self {
        let mut all_attrs = Attrs::with_capacity(attrs.len() + 1);
        all_attrs.push("xmlns", kind.namespace());
        for (key, value) in attrs {
            all_attrs.insert(key, value);
        }
        all_attrs.insert("xmlns", kind.namespace());

        Self {
            kind,
            node: Node {
                tag: kind.tag().to_string(),
                attrs: all_attrs,
                content,
            },
            correlation,
            parent: None,
        }
    }

    pub(crate) fn with_parent(mut self, parent: Correlation) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn tag(&self) -> &str {
        &self.node.tag
    }

    pub fn namespace(&self) -> &str {
        self.node.attrs.get("xmlns").unwrap_or_default()
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    pub fn correlation(&self) -> &Correlation {
        &self.correlation
    }

    pub fn call_id(&self) -> Option<&str> {
        self.correlation.call_id.as_deref()
    }

    pub fn command_id(&self) -> Option<&str> {
        self.correlation.command_id.as_deref()
    }

    /// Correlation of the message a sub-action was spawned from.
    pub fn parent(&self) -> Option<&Correlation> {
        self.parent.as_ref()
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.correlation.call_id = Some(call_id.into());
        self
    }

    pub fn with_command_id(mut self, command_id: impl Into<String>) -> Self {
        self.correlation.command_id = Some(command_id.into());
        self
    }

    /// Address the message is delivered to: the call, or for sub-actions the
    /// running command they act on (`call/command`).
    pub fn target(&self) -> Option<String> {
        let call_id = self.call_id()?;
        match self.parent.as_ref().and_then(|p| p.command_id.as_deref()) {
            Some(parent_command) => Some(format!("{call_id}/{parent_command}")),
            None => Some(call_id.to_string()),
        }
    }

    pub fn to_xml(&self) -> Result<String, CommandError> {
        Ok(ozcore_xml::marshal(&self.node)?)
    }
}
