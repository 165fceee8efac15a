//! Matches response events to the commands waiting for them.
//!
//! Every issued command registers a waiter under its `(call id, command id)`
//! pair before it is sent. The first event carrying that pair completes the
//! waiter and removes it. Waiters that time out, are cancelled, or whose
//! handle is dropped are removed too, so no entry outlives its command.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::{debug, warn};
use ozcore::error::EventError;
use ozcore::event::Event;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::timeout;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    pub call_id: String,
    pub command_id: String,
}

impl CorrelationKey {
    pub fn new(call_id: impl Into<String>, command_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            command_id: command_id.into(),
        }
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.call_id, self.command_id)
    }
}

#[derive(Debug, Error)]
pub enum CorrelationError {
    #[error("no response for command {key} within {timeout:?}")]
    Timeout { key: CorrelationKey, timeout: Duration },
    #[error("command {0} is already awaiting a response")]
    Duplicate(CorrelationKey),
    #[error("command {0} was cancelled")]
    Cancelled(CorrelationKey),
    #[error("command failed: {0}")]
    Failed(#[source] EventError),
}

type WaiterResult = Result<Event, EventError>;

struct Waiter {
    generation: u64,
    tx: oneshot::Sender<WaiterResult>,
}

/// Shared table of pending commands.
#[derive(Default)]
pub struct Correlator {
    waiters: Arc<DashMap<CorrelationKey, Waiter>>,
    next_generation: AtomicU64,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in the response to `key`.
    ///
    /// Fails if a waiter for the same pair is still pending.
    pub fn register(&self, key: CorrelationKey) -> Result<PendingCommand, CorrelationError> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        match self.waiters.entry(key.clone()) {
            Entry::Occupied(_) => return Err(CorrelationError::Duplicate(key)),
            Entry::Vacant(slot) => {
                slot.insert(Waiter { generation, tx });
            }
        }

        Ok(PendingCommand {
            key,
            generation,
            rx,
            waiters: Arc::clone(&self.waiters),
        })
    }

    /// Completes the waiter matching the event's correlation key.
    ///
    /// Returns `false` for offers and for events nobody waits for.
    pub fn deliver(&self, event: Event) -> bool {
        let Some((call_id, command_id)) = event.correlation_key() else {
            return false;
        };
        let key = CorrelationKey::new(call_id, command_id);
        self.complete(&key, Ok(event))
    }

    /// Fails the waiter for `key` with a protocol error.
    pub fn fail(&self, key: &CorrelationKey, error: EventError) -> bool {
        self.complete(key, Err(error))
    }

    fn complete(&self, key: &CorrelationKey, result: WaiterResult) -> bool {
        let Some((_, waiter)) = self.waiters.remove(key) else {
            return false;
        };
        if waiter.tx.send(result).is_err() {
            warn!(
                target: "Correlator",
                "Waiter for {key} was dropped before its response arrived"
            );
        }
        true
    }

    /// Drops the waiter for `key`; its `wait` returns `Cancelled`.
    pub fn cancel(&self, key: &CorrelationKey) -> bool {
        self.waiters.remove(key).is_some()
    }

    /// Cancels every command pending on a call.
    pub fn cancel_call(&self, call_id: &str) -> usize {
        let before = self.waiters.len();
        self.waiters.retain(|key, _| key.call_id != call_id);
        let cancelled = before.saturating_sub(self.waiters.len());
        if cancelled > 0 {
            debug!(target: "Correlator", "Cancelled {cancelled} pending command(s) on call {call_id}");
        }
        cancelled
    }

    pub fn cancel_all(&self) -> usize {
        let cancelled = self.waiters.len();
        self.waiters.clear();
        cancelled
    }

    pub fn is_pending(&self, key: &CorrelationKey) -> bool {
        self.waiters.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.waiters.len()
    }
}

/// Handle to one registered command.
///
/// Dropping the handle withdraws the registration.
pub struct PendingCommand {
    key: CorrelationKey,
    generation: u64,
    rx: oneshot::Receiver<WaiterResult>,
    waiters: Arc<DashMap<CorrelationKey, Waiter>>,
}

impl PendingCommand {
    pub fn key(&self) -> &CorrelationKey {
        &self.key
    }

    pub fn call_id(&self) -> &str {
        &self.key.call_id
    }

    pub fn command_id(&self) -> &str {
        &self.key.command_id
    }

    /// Waits for the matching event.
    ///
    /// On timeout the registration is removed before returning, so the same
    /// pair can be registered again right away.
    pub async fn wait(mut self, limit: Duration) -> Result<Event, CorrelationError> {
        match timeout(limit, &mut self.rx).await {
            Ok(Ok(Ok(event))) => Ok(event),
            Ok(Ok(Err(error))) => Err(CorrelationError::Failed(error)),
            Ok(Err(_)) => Err(CorrelationError::Cancelled(self.key.clone())),
            Err(_) => {
                self.withdraw();
                Err(CorrelationError::Timeout {
                    key: self.key.clone(),
                    timeout: limit,
                })
            }
        }
    }

    /// Abandons the command without waiting. Dropping the handle withdraws
    /// its registration.
    pub fn cancel(self) {}

    // A newer registration under the same key has a different generation
    // and must survive.
    fn withdraw(&self) {
        self.waiters
            .remove_if(&self.key, |_, waiter| waiter.generation == self.generation);
    }
}

impl Drop for PendingCommand {
    fn drop(&mut self) {
        self.withdraw();
    }
}

impl fmt::Debug for PendingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCommand")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .finish()
    }
}
