use super::Prompt;
use crate::command::options::OptionReader;
use crate::error::CommandError;
use ozcore_xml::node::{Attrs, Node};

/// Speaks text or plays an audio file to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SayOptions {
    pub content: Prompt,
    pub voice: Option<String>,
}

impl SayOptions {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Prompt::Text(text.into()),
            voice: None,
        }
    }

    pub fn audio(url: impl Into<String>) -> Self {
        Self {
            content: Prompt::Audio(url.into()),
            voice: None,
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub(crate) fn from_reader(reader: &mut OptionReader) -> Result<Self, CommandError> {
        Ok(Self {
            content: Prompt::from_reader(reader, "text", "audio")?,
            voice: reader.take("voice"),
        })
    }

    pub(crate) fn attrs(&self) -> Attrs {
        let mut attrs = Attrs::new();
        if let Some(voice) = &self.voice {
            attrs.push("voice", voice.as_str());
        }
        attrs
    }

    pub(crate) fn children(&self) -> Vec<Node> {
        vec![self.content.to_node()]
    }
}
