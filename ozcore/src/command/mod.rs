//! The command catalog.
//!
//! Each [`Command`] variant carries an explicit options struct and knows how
//! to assemble its own attributes and children. The namespace is never set
//! here: [`Message`] derives it from the command's family.

mod actions;
mod ask;
mod base;
mod conference;
pub mod options;
mod say;
mod transfer;

pub use ask::{AskOptions, DEFAULT_GRAMMAR, InputMode};
pub use base::{HeaderOptions, RedirectOptions, RejectOptions, RejectReason};
pub use conference::ConferenceOptions;
pub use say::SayOptions;
pub use transfer::TransferOptions;

use crate::error::CommandError;
use crate::message::{CommandKind, Correlation, Message};
use ozcore_xml::builder::NodeBuilder;
use ozcore_xml::node::{Attrs, Node, NodeContent};
use options::OptionReader;
use std::time::Duration;

/// Key prefix that marks a signaling header in loose option input,
/// e.g. `header.x-skill=agent`.
pub const HEADER_PREFIX: &str = "header.";

/// Spoken text or an audio file, used by prompts and say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Text(String),
    Audio(String),
}

impl Prompt {
    pub fn to_node(&self) -> Node {
        match self {
            Prompt::Text(text) => NodeBuilder::new("speak").text(text.as_str()).build(),
            Prompt::Audio(url) => NodeBuilder::new("audio").attr("url", url.as_str()).build(),
        }
    }

    fn from_reader(
        reader: &mut OptionReader,
        text_key: &'static str,
        audio_key: &'static str,
    ) -> Result<Self, CommandError> {
        match (reader.take(text_key), reader.take(audio_key)) {
            (Some(text), None) => Ok(Prompt::Text(text)),
            (None, Some(url)) => Ok(Prompt::Audio(url)),
            (Some(_), Some(_)) => Err(CommandError::InvalidOption {
                key: audio_key.to_string(),
                reason: format!("cannot be combined with '{text_key}'"),
            }),
            (None, None) => Err(CommandError::MissingOption {
                kind: "prompt",
                key: text_key,
            }),
        }
    }
}

pub(crate) fn header_nodes(headers: &[(String, String)]) -> Vec<Node> {
    headers
        .iter()
        .map(|(name, value)| {
            NodeBuilder::new("header")
                .attr("name", name.as_str())
                .attr("value", value.as_str())
                .build()
        })
        .collect()
}

pub(crate) fn format_seconds(duration: Duration) -> String {
    duration.as_secs_f64().to_string()
}

/// An outbound command, one variant per family.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Accept(HeaderOptions),
    Answer(HeaderOptions),
    Hangup(HeaderOptions),
    Reject(RejectOptions),
    Redirect(RedirectOptions),
    Ask(AskOptions),
    Say(SayOptions),
    Conference(ConferenceOptions),
    Transfer(TransferOptions),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Accept(_) => CommandKind::Accept,
            Command::Answer(_) => CommandKind::Answer,
            Command::Hangup(_) => CommandKind::Hangup,
            Command::Reject(_) => CommandKind::Reject,
            Command::Redirect(_) => CommandKind::Redirect,
            Command::Ask(_) => CommandKind::Ask,
            Command::Say(_) => CommandKind::Say,
            Command::Conference(_) => CommandKind::Conference,
            Command::Transfer(_) => CommandKind::Transfer,
        }
    }

    /// Builds a command from loosely-typed options.
    ///
    /// Every key must be recognized by the chosen command; leftovers fail
    /// with [`CommandError::UnknownOption`]. Transfer is the exception and
    /// passes unrecognized keys through as attributes. Sub-action kinds are
    /// rejected here since they are spawned from a running message.
    pub fn from_options<I, K, V>(kind: &str, options: I) -> Result<Self, CommandError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let kind: CommandKind = kind.parse()?;
        let mut reader = OptionReader::new(kind, options);

        let command = match kind {
            CommandKind::Accept => Command::Accept(HeaderOptions::from_reader(&mut reader)),
            CommandKind::Answer => Command::Answer(HeaderOptions::from_reader(&mut reader)),
            CommandKind::Hangup => Command::Hangup(HeaderOptions::from_reader(&mut reader)),
            CommandKind::Reject => Command::Reject(RejectOptions::from_reader(&mut reader)?),
            CommandKind::Redirect => Command::Redirect(RedirectOptions::from_reader(&mut reader)?),
            CommandKind::Ask => Command::Ask(AskOptions::from_reader(&mut reader)?),
            CommandKind::Say => Command::Say(SayOptions::from_reader(&mut reader)?),
            CommandKind::Conference => {
                Command::Conference(ConferenceOptions::from_reader(&mut reader)?)
            }
            CommandKind::Transfer => Command::Transfer(TransferOptions::from_reader(&mut reader)?),
            CommandKind::Pause
            | CommandKind::Resume
            | CommandKind::Stop
            | CommandKind::Mute
            | CommandKind::Unmute
            | CommandKind::Kick => {
                return Err(CommandError::InvalidSubAction {
                    action: kind.tag(),
                    family: "standalone",
                });
            }
        };

        reader.finish()?;
        Ok(command)
    }

    /// Assembles the outbound message for this command.
    pub fn build(self, correlation: Correlation) -> Result<Message, CommandError> {
        let kind = self.kind();
        let (attrs, children) = match &self {
            Command::Accept(opts) | Command::Answer(opts) | Command::Hangup(opts) => {
                (Attrs::new(), opts.children())
            }
            Command::Reject(opts) => (Attrs::new(), opts.children()),
            Command::Redirect(opts) => {
                opts.validate()?;
                let mut attrs = Attrs::new();
                attrs.push("to", opts.to.as_str());
                (attrs, header_nodes(&opts.headers))
            }
            Command::Ask(opts) => (opts.attrs(), opts.children()),
            Command::Say(opts) => (opts.attrs(), opts.children()),
            Command::Conference(opts) => {
                opts.validate()?;
                (opts.attrs(), opts.children())
            }
            Command::Transfer(opts) => {
                opts.validate()?;
                (opts.attrs(), Vec::new())
            }
        };

        let content = if children.is_empty() {
            None
        } else {
            Some(NodeContent::Nodes(children))
        };
        Ok(Message::from_parts(kind, attrs, content, correlation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::DisplayableNode;
    use ozcore_xml::unmarshal;

    fn call() -> Correlation {
        Correlation::call("c1")
    }

    #[test]
    fn ask_defaults_choices_grammar() {
        let msg = Command::Ask(AskOptions::new(
            "Please enter your postal code.",
            "[5 DIGITS]",
        ))
        .build(call())
        .unwrap();

        assert_eq!(msg.namespace(), "urn:xmpp:ozone:ask:1");
        let node = unmarshal(&msg.to_xml().unwrap()).unwrap();
        let choices = node.get_optional_child("choices").unwrap();
        assert_eq!(
            choices.attrs.get("content-type"),
            Some("application/grammar+voxeo")
        );
        assert_eq!(choices.text(), Some("[5 DIGITS]"));
        let speak = node.get_optional_child_by_tag(&["prompt", "speak"]).unwrap();
        assert_eq!(speak.text(), Some("Please enter your postal code."));
    }

    #[test]
    fn ask_grammar_and_attributes() {
        let msg = Command::Ask(
            AskOptions::new("Say a color", "red, green")
                .with_grammar("text/plain")
                .with_timeout(Duration::from_secs(30))
                .with_voice("allison")
                .with_recognizer("en-US")
                .with_mode(InputMode::Speech),
        )
        .build(call())
        .unwrap();

        assert_eq!(
            msg.to_xml().unwrap(),
            concat!(
                r#"<ask xmlns="urn:xmpp:ozone:ask:1" voice="allison" timeout="30" recognizer="en-US" mode="speech">"#,
                r#"<prompt><speak>Say a color</speak></prompt>"#,
                r#"<choices content-type="text/plain">red, green</choices>"#,
                r#"</ask>"#
            )
        );
    }

    #[test]
    fn base_commands_share_namespace() {
        let commands = [
            Command::Accept(HeaderOptions::default()),
            Command::Answer(HeaderOptions::default().with_header("x-a", "1")),
            Command::Hangup(HeaderOptions::default()),
            Command::Reject(RejectOptions::new(RejectReason::Busy)),
            Command::Redirect(RedirectOptions::new("tel:+14155551212")),
        ];
        for command in commands {
            let msg = command.build(call()).unwrap();
            assert_eq!(msg.namespace(), "urn:xmpp:ozone:1", "{}", msg.tag());
        }
    }

    #[test]
    fn reject_writes_reason_then_headers() {
        let mut opts = RejectOptions::new(RejectReason::Busy);
        opts.headers.push(("x-why".into(), "queue full".into()));
        let msg = Command::Reject(opts).build(call()).unwrap();
        assert_eq!(
            msg.to_xml().unwrap(),
            r#"<reject xmlns="urn:xmpp:ozone:1"><busy/><header name="x-why" value="queue full"/></reject>"#
        );
    }

    #[test]
    fn redirect_requires_destination() {
        let err = Command::Redirect(RedirectOptions::new(" "))
            .build(call())
            .unwrap_err();
        assert!(matches!(err, CommandError::MissingOption { key: "to", .. }));
    }

    #[test]
    fn conference_music_only_when_requested() {
        let plain = Command::Conference(ConferenceOptions::new("room-1"))
            .build(call())
            .unwrap();
        assert!(plain.node().children().is_none());
        assert_eq!(plain.namespace(), "urn:xmpp:ozone:conference:1");

        let with_music = Command::Conference(
            ConferenceOptions::new("room-1")
                .with_prompt("Please wait")
                .with_audio("http://example.com/hold.mp3"),
        )
        .build(call())
        .unwrap();
        let music = with_music.node().get_optional_child("music").unwrap();
        assert_eq!(music.get_optional_child("speak").and_then(|n| n.text()), Some("Please wait"));
        assert_eq!(
            music.get_optional_child("audio").and_then(|n| n.attrs.get("url")),
            Some("http://example.com/hold.mp3")
        );
    }

    #[test]
    fn transfer_copies_attributes_verbatim() {
        let msg = Command::Transfer(
            TransferOptions::new("sip:agent@example.com")
                .with_attribute("timeout", "20")
                .with_attribute("answer-on-media", "true"),
        )
        .build(call())
        .unwrap();
        assert_eq!(
            msg.to_xml().unwrap(),
            r#"<transfer xmlns="urn:xmpp:ozone:transfer:1" to="sip:agent@example.com" timeout="20" answer-on-media="true"/>"#
        );

        let err = Command::Transfer(TransferOptions::new("sip:a").with_attribute("bad key", "x"))
            .build(call())
            .unwrap_err();
        assert!(matches!(err, CommandError::InvalidOption { key, .. } if key == "bad key"));
    }

    #[test]
    fn say_audio_prompt() {
        let msg = Command::Say(SayOptions::audio("http://example.com/hello.wav"))
            .build(call())
            .unwrap();
        assert_eq!(
            DisplayableNode(msg.node()).to_string(),
            r#"<say xmlns="urn:xmpp:ozone:say:1"><audio url="http://example.com/hello.wav"/></say>"#
        );
    }

    #[test]
    fn from_options_builds_typed_command() {
        let command = Command::from_options(
            "ask",
            [
                ("prompt", "Please enter your postal code."),
                ("choices", "[5 DIGITS]"),
                ("timeout", "10"),
            ],
        )
        .unwrap();
        match command {
            Command::Ask(opts) => {
                assert_eq!(opts.timeout, Some(Duration::from_secs(10)));
                assert_eq!(opts.grammar, None);
            }
            other => panic!("expected ask, got {other:?}"),
        }

        let answer = Command::from_options("answer", [("header.x-skill", "agent")]).unwrap();
        assert_eq!(
            answer,
            Command::Answer(HeaderOptions::default().with_header("x-skill", "agent"))
        );
    }

    #[test]
    fn from_options_rejects_unknown_and_unsupported() {
        let err = Command::from_options("say", [("text", "hi"), ("volume", "11")]).unwrap_err();
        assert!(matches!(err, CommandError::UnknownOption { kind: "say", key } if key == "volume"));

        let err = Command::from_options("dial", Vec::<(String, String)>::new()).unwrap_err();
        assert!(matches!(err, CommandError::UnsupportedCommand(_)));

        let err = Command::from_options("pause", Vec::<(String, String)>::new()).unwrap_err();
        assert!(matches!(err, CommandError::InvalidSubAction { action: "pause", .. }));

        let err = Command::from_options("ask", [("prompt", "x")]).unwrap_err();
        assert!(matches!(err, CommandError::MissingOption { key: "choices", .. }));
    }

    #[test]
    fn from_options_transfer_passes_extra_keys_through() {
        let command =
            Command::from_options("transfer", [("to", "tel:+1"), ("ring-timeout", "15")]).unwrap();
        let msg = command.build(call()).unwrap();
        assert_eq!(msg.node().attrs.get("ring-timeout"), Some("15"));
    }
}
