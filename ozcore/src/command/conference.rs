use crate::command::options::OptionReader;
use crate::error::CommandError;
use ozcore_xml::builder::NodeBuilder;
use ozcore_xml::node::{Attrs, Node};

/// Joins the call to a named conference room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConferenceOptions {
    pub name: String,
    pub mute: bool,
    pub beep: bool,
    pub tone_passthrough: bool,
    pub terminator: Option<String>,
    /// Text spoken while the caller waits for others to join.
    pub prompt: Option<String>,
    /// Audio played while the caller waits for others to join.
    pub audio_url: Option<String>,
}

impl ConferenceOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mute: false,
            beep: true,
            tone_passthrough: true,
            terminator: None,
            prompt: None,
            audio_url: None,
        }
    }

    pub fn muted(mut self, mute: bool) -> Self {
        self.mute = mute;
        self
    }

    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = Some(terminator.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_audio(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    pub(crate) fn from_reader(reader: &mut OptionReader) -> Result<Self, CommandError> {
        let defaults = Self::new(reader.require("name")?);
        Ok(Self {
            mute: reader.take_bool("mute")?.unwrap_or(defaults.mute),
            beep: reader.take_bool("beep")?.unwrap_or(defaults.beep),
            tone_passthrough: reader
                .take_bool("tone-passthrough")?
                .unwrap_or(defaults.tone_passthrough),
            terminator: reader.take("terminator"),
            prompt: reader.take("prompt"),
            audio_url: reader.take("audio-url"),
            ..defaults
        })
    }

    pub(crate) fn validate(&self) -> Result<(), CommandError> {
        if self.name.trim().is_empty() {
            return Err(CommandError::MissingOption {
                kind: "conference",
                key: "name",
            });
        }
        Ok(())
    }

    pub(crate) fn attrs(&self) -> Attrs {
        let mut attrs = Attrs::new();
        attrs.push("name", self.name.as_str());
        attrs.push("mute", self.mute.to_string());
        attrs.push("beep", self.beep.to_string());
        attrs.push("tone-passthrough", self.tone_passthrough.to_string());
        if let Some(terminator) = &self.terminator {
            attrs.push("terminator", terminator.as_str());
        }
        attrs
    }

    pub(crate) fn children(&self) -> Vec<Node> {
        let mut music = Vec::new();
        if let Some(prompt) = &self.prompt {
            music.push(NodeBuilder::new("speak").text(prompt.as_str()).build());
        }
        if let Some(url) = &self.audio_url {
            music.push(NodeBuilder::new("audio").attr("url", url.as_str()).build());
        }

        if music.is_empty() {
            Vec::new()
        } else {
            vec![NodeBuilder::new("music").children(music).build()]
        }
    }
}
