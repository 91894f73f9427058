//! Idempotency map for message submission
//!
//! Maps a client-supplied message id to the message it created so a retried
//! send converges on one stored message. Keys are scoped to the sender, so two
//! users picking the same client id never resolve each other's messages.
//! Entries live for a fixed TTL and are swept lazily, at most once per sweep
//! interval.
//!
//! The lookup and the later insert are not atomic: two connections of one
//! sender racing on the same client id can both miss and create two messages. Events of one
//! connection are processed in order, so a single client never races itself.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use market_core::EntityId;

type Key = (EntityId, String);

#[derive(Debug, Clone, Copy)]
struct Entry {
    message_id: EntityId,
    inserted_at: Instant,
}

/// Process-local `(senderId, clientMessageId) -> messageId` map with TTL
#[derive(Debug)]
pub struct IdempotencyStore {
    entries: DashMap<Key, Entry>,
    ttl: Duration,
    sweep_interval: Duration,
    last_sweep: Mutex<Instant>,
}

impl IdempotencyStore {
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            sweep_interval,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Drop expired entries unless a sweep ran within the sweep interval.
    /// Returns the number of entries removed.
    pub fn sweep_if_due(&self) -> usize {
        self.sweep_if_due_at(Instant::now())
    }

    fn sweep_if_due_at(&self, now: Instant) -> usize {
        {
            let mut last = self.last_sweep.lock();
            if now.saturating_duration_since(*last) < self.sweep_interval {
                return 0;
            }
            *last = now;
        }

        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < self.ttl);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "Swept expired idempotency entries");
        }
        removed
    }

    /// Message `sender_id` previously created for `client_message_id`, if still live
    pub fn lookup(&self, sender_id: EntityId, client_message_id: &str) -> Option<EntityId> {
        self.lookup_at(sender_id, client_message_id, Instant::now())
    }

    fn lookup_at(&self, sender_id: EntityId, client_message_id: &str, now: Instant) -> Option<EntityId> {
        let key = (sender_id, client_message_id.to_string());
        let entry = *self.entries.get(&key)?;
        if now.saturating_duration_since(entry.inserted_at) < self.ttl {
            Some(entry.message_id)
        } else {
            self.entries.remove(&key);
            None
        }
    }

    /// Remember which message `sender_id` created for `client_message_id`
    pub fn record(&self, sender_id: EntityId, client_message_id: impl Into<String>, message_id: EntityId) {
        self.entries.insert(
            (sender_id, client_message_id.into()),
            Entry {
                message_id,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop a mapping whose message no longer exists
    pub fn forget(&self, sender_id: EntityId, client_message_id: &str) {
        self.entries.remove(&(sender_id, client_message_id.to_string()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(6 * 60 * 60);
    const SWEEP: Duration = Duration::from_secs(60);

    #[test]
    fn test_record_and_lookup() {
        let store = IdempotencyStore::new(TTL, SWEEP);
        let sender = EntityId::generate();
        let id = EntityId::generate();
        store.record(sender, "abc", id);

        assert_eq!(store.lookup(sender, "abc"), Some(id));
        assert_eq!(store.lookup(sender, "other"), None);

        store.forget(sender, "abc");
        assert!(store.is_empty());
    }

    #[test]
    fn test_same_client_id_is_scoped_per_sender() {
        let store = IdempotencyStore::new(TTL, SWEEP);
        let (alice, bob) = (EntityId::generate(), EntityId::generate());
        let first = EntityId::generate();
        store.record(alice, "1", first);

        assert_eq!(store.lookup(bob, "1"), None);

        let second = EntityId::generate();
        store.record(bob, "1", second);
        assert_eq!(store.lookup(alice, "1"), Some(first));
        assert_eq!(store.lookup(bob, "1"), Some(second));
    }

    #[test]
    fn test_expired_entry_is_not_returned() {
        let store = IdempotencyStore::new(TTL, SWEEP);
        let sender = EntityId::generate();
        store.record(sender, "abc", EntityId::generate());

        let later = Instant::now() + TTL + Duration::from_secs(1);
        assert_eq!(store.lookup_at(sender, "abc", later), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_sweep_runs_at_most_once_per_interval() {
        let store = IdempotencyStore::new(Duration::from_secs(10), SWEEP);
        let sender = EntityId::generate();
        store.record(sender, "a", EntityId::generate());
        store.record(sender, "b", EntityId::generate());

        let now = Instant::now();
        // Too soon after construction
        assert_eq!(store.sweep_if_due_at(now + Duration::from_secs(30)), 0);
        assert_eq!(store.len(), 2);

        assert_eq!(store.sweep_if_due_at(now + SWEEP + Duration::from_secs(1)), 2);

        store.record(sender, "c", EntityId::generate());
        // Throttled again, even though "c" would not be expired anyway
        assert_eq!(store.sweep_if_due_at(now + SWEEP + Duration::from_secs(2)), 0);
        assert_eq!(store.len(), 1);
    }
}
