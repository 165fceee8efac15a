use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings for a [`Client`](crate::client::Client).
///
/// Every field has a default, so a config file only needs the keys it
/// overrides. Durations are written as milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Used by `execute` when the caller does not pass a timeout.
    #[serde(rename = "default_timeout_ms", with = "duration_millis")]
    pub default_timeout: Duration,
    /// Prefix for generated command ids. A random hex prefix when unset.
    pub command_id_prefix: Option<String>,
    /// Buffer size of the new-call channel.
    pub new_call_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(60),
            command_id_prefix: None,
            new_call_capacity: 32,
        }
    }
}

impl ClientConfig {
    pub fn from_json_str(json: &str) -> Result<Self, anyhow::Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.new_call_capacity == 0 {
            anyhow::bail!("new_call_capacity must be at least 1");
        }
        if self.command_id_prefix.as_deref() == Some("") {
            anyhow::bail!("command_id_prefix must not be empty");
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer, ser};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).map_err(<S::Error as ser::Error>::custom)?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ClientConfig::from_json_str(r#"{"default_timeout_ms": 1500}"#).unwrap();
        assert_eq!(config.default_timeout, Duration::from_millis(1500));
        assert_eq!(config.command_id_prefix, None);
        assert_eq!(config.new_call_capacity, 32);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(ClientConfig::from_json_str(r#"{"new_call_capacity": 0}"#).is_err());
        assert!(ClientConfig::from_json_str(r#"{"command_id_prefix": ""}"#).is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"command_id_prefix": "ivr", "new_call_capacity": 4}}"#).unwrap();

        let config = ClientConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.command_id_prefix.as_deref(), Some("ivr"));
        assert_eq!(config.new_call_capacity, 4);
        assert_eq!(config.default_timeout, Duration::from_secs(60));
    }

    #[test]
    fn oversized_timeout_fails_to_serialize() {
        let config = ClientConfig {
            default_timeout: Duration::MAX,
            ..ClientConfig::default()
        };
        assert!(serde_json::to_string(&config).is_err());
    }

    #[test]
    fn serializes_timeout_as_millis() {
        let json = serde_json::to_value(ClientConfig::default()).unwrap();
        assert_eq!(json["default_timeout_ms"], 60_000);
    }
}
