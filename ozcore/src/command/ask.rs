use super::{Prompt, format_seconds};
use crate::command::options::OptionReader;
use crate::error::CommandError;
use ozcore_xml::builder::NodeBuilder;
use ozcore_xml::node::{Attrs, Node};
use std::time::Duration;

/// Grammar type used for `choices` when none is given.
pub const DEFAULT_GRAMMAR: &str = "application/grammar+voxeo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Dtmf,
    Speech,
    Any,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Dtmf => "dtmf",
            InputMode::Speech => "speech",
            InputMode::Any => "any",
        }
    }
}

impl std::str::FromStr for InputMode {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dtmf" => Ok(InputMode::Dtmf),
            "speech" => Ok(InputMode::Speech),
            "any" => Ok(InputMode::Any),
            other => Err(CommandError::InvalidOption {
                key: "mode".to_string(),
                reason: format!("'{other}' is not one of dtmf, speech, any"),
            }),
        }
    }
}

/// Plays a prompt and collects input matching `choices`.
#[derive(Debug, Clone, PartialEq)]
pub struct AskOptions {
    pub prompt: Prompt,
    pub choices: String,
    pub timeout: Option<Duration>,
    pub recognizer: Option<String>,
    pub voice: Option<String>,
    /// Content type of `choices`; falls back to [`DEFAULT_GRAMMAR`].
    pub grammar: Option<String>,
    pub mode: Option<InputMode>,
    pub terminator: Option<String>,
}

impl AskOptions {
    pub fn new(prompt: impl Into<String>, choices: impl Into<String>) -> Self {
        Self {
            prompt: Prompt::Text(prompt.into()),
            choices: choices.into(),
            timeout: None,
            recognizer: None,
            voice: None,
            grammar: None,
            mode: None,
            terminator: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_recognizer(mut self, recognizer: impl Into<String>) -> Self {
        self.recognizer = Some(recognizer.into());
        self
    }

    pub fn with_grammar(mut self, grammar: impl Into<String>) -> Self {
        self.grammar = Some(grammar.into());
        self
    }

    pub fn with_mode(mut self, mode: InputMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = Some(terminator.into());
        self
    }

    pub(crate) fn from_reader(reader: &mut OptionReader) -> Result<Self, CommandError> {
        let prompt = Prompt::from_reader(reader, "prompt", "audio")?;
        let choices = reader.require("choices")?;
        Ok(Self {
            prompt,
            choices,
            timeout: reader.take_seconds("timeout")?,
            recognizer: reader.take("recognizer"),
            voice: reader.take("voice"),
            grammar: reader.take("grammar"),
            mode: reader.take("mode").map(|m| m.parse()).transpose()?,
            terminator: reader.take("terminator"),
        })
    }

    pub(crate) fn attrs(&self) -> Attrs {
        let mut attrs = Attrs::new();
        if let Some(voice) = &self.voice {
            attrs.push("voice", voice.as_str());
        }
        if let Some(timeout) = self.timeout {
            attrs.push("timeout", format_seconds(timeout));
        }
        if let Some(recognizer) = &self.recognizer {
            attrs.push("recognizer", recognizer.as_str());
        }
        if let Some(mode) = self.mode {
            attrs.push("mode", mode.as_str());
        }
        if let Some(terminator) = &self.terminator {
            attrs.push("terminator", terminator.as_str());
        }
        attrs
    }

    pub(crate) fn children(&self) -> Vec<Node> {
        let content_type = self.grammar.as_deref().unwrap_or(DEFAULT_GRAMMAR);
        vec![
            NodeBuilder::new("prompt")
                .children([self.prompt.to_node()])
                .build(),
            NodeBuilder::new("choices")
                .attr("content-type", content_type)
                .text(self.choices.as_str())
                .build(),
        ]
    }
}
