//! Classification of inbound documents into typed events.
//!
//! Only the root element and its immediate children are inspected. The
//! correlation ids are supplied by the transport (they travel in the stanza
//! envelope, not in the payload) and copied onto every non-offer event.

use crate::error::EventError;
use log::debug;
use ozcore_xml::node::Node;
use serde::Serialize;
use std::collections::HashMap;

/// Header name to value. Repeated names keep the last value seen.
pub type Headers = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Offer,
    Complete,
    Info,
    End,
}

impl EventKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "offer" => Some(Self::Offer),
            "complete" => Some(Self::Complete),
            "info" => Some(Self::Info),
            "end" => Some(Self::End),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Complete => "complete",
            Self::Info => "info",
            Self::End => "end",
        }
    }
}

/// A new inbound call. Offers start a call context and never answer a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offer {
    pub to: String,
    pub from: Option<String>,
    pub headers: Headers,
}

/// A command finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Complete {
    pub call_id: String,
    pub command_id: String,
    /// Tag of the first non-header child, e.g. `success` or `hangup`.
    pub reason: Option<String>,
    pub headers: Headers,
}

/// Intermediate information about a call or a running command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Info {
    pub call_id: String,
    pub command_id: String,
    /// Tag of the first non-header child, e.g. `ringing` or `answered`.
    pub name: Option<String>,
    pub headers: Headers,
}

/// The call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct End {
    pub call_id: String,
    pub command_id: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Offer(Offer),
    Complete(Complete),
    Info(Info),
    End(End),
}

impl Event {
    /// Classifies an element by its tag name.
    ///
    /// Returns `Ok(None)` for tags that are not events; callers should ignore
    /// such documents. An `end` whose first child is `error` is reported as
    /// [`EventError::Protocol`] rather than as an end event.
    pub fn parse(call_id: &str, command_id: &str, node: &Node) -> Result<Option<Self>, EventError> {
        let Some(kind) = EventKind::from_tag(&node.tag) else {
            debug!(target: "Event", "<{}> on call {call_id} is not an event", node.tag);
            return Ok(None);
        };

        let event = match kind {
            EventKind::Offer => {
                let mut attrs = node.attrs();
                let to = attrs.required_string("to")?.to_string();
                let from = attrs.optional_string("from").map(str::to_string);
                Event::Offer(Offer {
                    to,
                    from,
                    headers: parse_headers(node)?,
                })
            }
            EventKind::Complete => Event::Complete(Complete {
                call_id: call_id.to_string(),
                command_id: command_id.to_string(),
                reason: first_non_header_tag(node),
                headers: parse_headers(node)?,
            }),
            EventKind::Info => Event::Info(Info {
                call_id: call_id.to_string(),
                command_id: command_id.to_string(),
                name: first_non_header_tag(node),
                headers: parse_headers(node)?,
            }),
            EventKind::End => match node.first_child() {
                Some(child) if child.tag == "error" => {
                    return Err(EventError::Protocol {
                        call_id: call_id.to_string(),
                        command_id: command_id.to_string(),
                        condition: error_condition(child),
                    });
                }
                child => Event::End(End {
                    call_id: call_id.to_string(),
                    command_id: command_id.to_string(),
                    reason: child.map(|c| c.tag.clone()),
                }),
            },
        };

        Ok(Some(event))
    }

    /// Parses a raw XML document and classifies its root element.
    pub fn parse_document(
        call_id: &str,
        command_id: &str,
        xml: &str,
    ) -> Result<Option<Self>, EventError> {
        let node = ozcore_xml::unmarshal(xml)?;
        Self::parse(call_id, command_id, &node)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Offer(_) => EventKind::Offer,
            Event::Complete(_) => EventKind::Complete,
            Event::Info(_) => EventKind::Info,
            Event::End(_) => EventKind::End,
        }
    }

    /// `(call id, command id)` of a response event; offers have none.
    pub fn correlation_key(&self) -> Option<(&str, &str)> {
        match self {
            Event::Offer(_) => None,
            Event::Complete(c) => Some((&c.call_id, &c.command_id)),
            Event::Info(i) => Some((&i.call_id, &i.command_id)),
            Event::End(e) => Some((&e.call_id, &e.command_id)),
        }
    }

    pub fn headers(&self) -> Option<&Headers> {
        match self {
            Event::Offer(o) => Some(&o.headers),
            Event::Complete(c) => Some(&c.headers),
            Event::Info(i) => Some(&i.headers),
            Event::End(_) => None,
        }
    }
}

fn parse_headers(node: &Node) -> Result<Headers, EventError> {
    let mut headers = Headers::new();
    for header in node.get_children_by_tag("header") {
        let mut attrs = header.attrs();
        let name = attrs.required_string("name")?;
        let value = attrs.optional_string("value").unwrap_or_default();
        headers.insert(name.to_string(), value.to_string());
    }
    Ok(headers)
}

fn first_non_header_tag(node: &Node) -> Option<String> {
    node.children()?
        .iter()
        .find(|child| child.tag != "header")
        .map(|child| child.tag.clone())
}

fn error_condition(error: &Node) -> String {
    error
        .first_child()
        .map(|c| c.tag.clone())
        .or_else(|| error.text().map(|t| t.trim().to_string()))
        .unwrap_or_else(|| "unspecified".to_string())
}
