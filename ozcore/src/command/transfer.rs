use crate::command::options::OptionReader;
use crate::error::CommandError;
use ozcore_xml::is_valid_name;
use ozcore_xml::node::Attrs;

/// Bridges the call to another destination.
///
/// Besides `to`, any attribute the caller supplies is written verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOptions {
    pub to: String,
    pub attributes: Vec<(String, String)>,
}

impl TransferOptions {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub(crate) fn from_reader(reader: &mut OptionReader) -> Result<Self, CommandError> {
        Ok(Self {
            to: reader.require("to")?,
            attributes: reader.drain(),
        })
    }

    pub(crate) fn validate(&self) -> Result<(), CommandError> {
        if self.to.trim().is_empty() {
            return Err(CommandError::MissingOption {
                kind: "transfer",
                key: "to",
            });
        }
        for (name, _) in &self.attributes {
            if !is_valid_name(name) || name == "xmlns" || name == "to" {
                return Err(CommandError::InvalidOption {
                    key: name.clone(),
                    reason: "not usable as a transfer attribute name".to_string(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn attrs(&self) -> Attrs {
        let mut attrs = Attrs::with_capacity(self.attributes.len() + 1);
        attrs.push("to", self.to.as_str());
        for (name, value) in &self.attributes {
            attrs.insert(name.as_str(), value.as_str());
        }
        attrs
    }
}
