use rand::RngCore;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generates command ids of the form `<unique>-<counter>`.
///
/// The unique part distinguishes client instances; the counter makes ids
/// unique within one instance.
#[derive(Debug, Clone)]
pub struct CommandIdGenerator {
    unique_id: String,
    id_counter: Arc<AtomicU64>,
}

impl CommandIdGenerator {
    pub fn new(unique_id: impl Into<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
            id_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Uses a short random prefix.
    pub fn random() -> Self {
        let mut unique_id_bytes = [0u8; 2];
        rand::rng().fill_bytes(&mut unique_id_bytes);
        Self::new(hex::encode(unique_id_bytes))
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn generate_command_id(&self) -> String {
        let count = self.id_counter.fetch_add(1, Ordering::Relaxed);
        format!(
            "{unique_id}-{count}",
            unique_id = self.unique_id,
            count = count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_per_generator() {
        let ids = CommandIdGenerator::new("ab");
        assert_eq!(ids.generate_command_id(), "ab-0");
        assert_eq!(ids.generate_command_id(), "ab-1");

        let shared = ids.clone();
        assert_eq!(shared.generate_command_id(), "ab-2");
    }

    #[test]
    fn random_prefix_is_hex() {
        let ids = CommandIdGenerator::random();
        assert_eq!(ids.unique_id().len(), 4);
        assert!(ids.unique_id().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
