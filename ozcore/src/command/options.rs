use crate::error::CommandError;
use crate::message::CommandKind;
use std::time::Duration;

/// Consumes loosely-typed `key=value` options for one command.
///
/// Each command takes the keys it understands; whatever is left when
/// [`OptionReader::finish`] runs is rejected as an unknown option.
#[derive(Debug)]
pub struct OptionReader {
    kind: CommandKind,
    options: Vec<(String, String)>,
}

impl OptionReader {
    pub fn new<I, K, V>(kind: CommandKind, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind,
            options: options
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Removes every occurrence of `key`, returning the last value given.
    pub fn take(&mut self, key: &str) -> Option<String> {
        let mut found = None;
        self.options.retain(|(k, v)| {
            if k == key {
                found = Some(v.clone());
                false
            } else {
                true
            }
        });
        found
    }

    pub fn require(&mut self, key: &'static str) -> Result<String, CommandError> {
        self.take(key).ok_or(CommandError::MissingOption {
            kind: self.kind.tag(),
            key,
        })
    }

    pub fn take_bool(&mut self, key: &str) -> Result<Option<bool>, CommandError> {
        self.take(key)
            .map(|v| {
                v.parse::<bool>().map_err(|e| CommandError::InvalidOption {
                    key: key.to_string(),
                    reason: format!("'{v}' is not a boolean: {e}"),
                })
            })
            .transpose()
    }

    /// Parses a value given in (possibly fractional) seconds.
    pub fn take_seconds(&mut self, key: &str) -> Result<Option<Duration>, CommandError> {
        self.take(key)
            .map(|v| {
                v.parse::<f64>()
                    .ok()
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                    .ok_or_else(|| CommandError::InvalidOption {
                        key: key.to_string(),
                        reason: format!("'{v}' is not a non-negative number of seconds"),
                    })
            })
            .transpose()
    }

    /// Takes every option whose key starts with `prefix`, stripping the prefix.
    pub fn take_prefixed(&mut self, prefix: &str) -> Vec<(String, String)> {
        let mut taken = Vec::new();
        self.options.retain(|(k, v)| match k.strip_prefix(prefix) {
            Some(rest) => {
                taken.push((rest.to_string(), v.clone()));
                false
            }
            None => true,
        });
        taken
    }

    /// Takes everything that is left.
    pub fn drain(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.options)
    }

    pub fn finish(self) -> Result<(), CommandError> {
        match self.options.into_iter().next() {
            None => Ok(()),
            Some((key, _)) => Err(CommandError::UnknownOption {
                kind: self.kind.tag(),
                key,
            }),
        }
    }
}
