//! Concurrent envelope store shared between ingress and query paths.
//!
//! The store is the only shared mutable state in the relay. It owns its
//! exclusion primitive internally and never leaks the backing container:
//! writers hand envelopes over on `append`, readers get point-in-time
//! `Arc` snapshots of immutable envelopes, so a reader can never observe a
//! torn or partially-applied record.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;

/// Retention shape of the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// Ordered history with FIFO eviction once `capacity` is reached.
    #[default]
    History,
    /// Single-slot register holding only the most recent envelope.
    Latest,
}

/// Ordering of a snapshot read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Oldest first, exactly as appended.
    #[default]
    Insertion,
    /// Newest first, as the polling dashboards display.
    #[serde(alias = "newest")]
    NewestFirst,
}

struct Inner {
    entries: VecDeque<Arc<Envelope>>,
    /// Total appends since process start; unlike `entries.len()` this never
    /// shrinks on eviction or replacement.
    appended: u64,
}

/// Mode-switched envelope store with interior exclusion.
pub struct EnvelopeStore {
    inner: RwLock<Inner>,
    mode: StoreMode,
    capacity: usize,
}

impl EnvelopeStore {
    /// History-mode store retaining at most `capacity` envelopes.
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn history(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be non-zero");
        Self {
            inner: RwLock::new(Inner {
                entries: VecDeque::with_capacity(capacity.min(1024)),
                appended: 0,
            }),
            mode: StoreMode::History,
            capacity,
        }
    }

    /// Latest-only store: each append atomically replaces the previous slot.
    pub fn latest_only() -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: VecDeque::with_capacity(1),
                appended: 0,
            }),
            mode: StoreMode::Latest,
            capacity: 1,
        }
    }

    pub fn with_mode(mode: StoreMode, capacity: usize) -> Self {
        match mode {
            StoreMode::History => Self::history(capacity),
            StoreMode::Latest => Self::latest_only(),
        }
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    /// Appends one envelope, evicting the oldest entry when at capacity
    /// (history mode) or replacing the slot (latest mode).
    ///
    /// Returns the total number of envelopes appended so far, which also
    /// serves as the 1-based position of this envelope in arrival order.
    pub fn append(&self, envelope: Envelope) -> u64 {
        let mut inner = self.inner.write();
        if inner.entries.len() == self.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(Arc::new(envelope));
        inner.appended += 1;
        inner.appended
    }

    /// Point-in-time copy of the retained history in the requested order.
    pub fn snapshot(&self, order: Order) -> Vec<Arc<Envelope>> {
        let inner = self.inner.read();
        match order {
            Order::Insertion => inner.entries.iter().cloned().collect(),
            Order::NewestFirst => inner.entries.iter().rev().cloned().collect(),
        }
    }

    /// Most recent envelope, or `None` if nothing was ever stored.
    pub fn current(&self) -> Option<Arc<Envelope>> {
        self.inner.read().entries.back().cloned()
    }

    /// Number of envelopes currently retained.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Total appends since creation, independent of eviction.
    pub fn total_appended(&self) -> u64 {
        self.inner.read().appended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Payload, Source, Transport};
    use serde_json::json;

    fn envelope(seq: u64) -> Envelope {
        Envelope::now(
            Source::new(Transport::Http, "10.0.0.2:40000".parse().unwrap()),
            Payload::Structured(json!({ "seq": seq })),
        )
    }

    fn seq_of(envelope: &Envelope) -> u64 {
        envelope.payload.as_value().unwrap()["seq"].as_u64().unwrap()
    }

    #[test]
    fn append_then_read() {
        let store = EnvelopeStore::history(8);
        let e = envelope(1);
        assert_eq!(store.append(e.clone()), 1);
        let snap = store.snapshot(Order::Insertion);
        assert_eq!(snap.len(), 1);
        assert_eq!(*snap[0], e);
        assert_eq!(*store.current().unwrap(), e);
    }

    #[test]
    fn preserves_insertion_order() {
        let store = EnvelopeStore::history(8);
        for i in 1..=4 {
            store.append(envelope(i));
        }
        let forward: Vec<u64> = store
            .snapshot(Order::Insertion)
            .iter()
            .map(|e| seq_of(e))
            .collect();
        assert_eq!(forward, vec![1, 2, 3, 4]);

        let newest: Vec<u64> = store
            .snapshot(Order::NewestFirst)
            .iter()
            .map(|e| seq_of(e))
            .collect();
        assert_eq!(newest, vec![4, 3, 2, 1]);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let store = EnvelopeStore::history(3);
        for i in 1..=5 {
            store.append(envelope(i));
        }
        let retained: Vec<u64> = store
            .snapshot(Order::Insertion)
            .iter()
            .map(|e| seq_of(e))
            .collect();
        assert_eq!(retained, vec![3, 4, 5]);
        assert_eq!(store.total_appended(), 5);
    }

    #[test]
    fn latest_mode_replaces_slot() {
        let store = EnvelopeStore::latest_only();
        store.append(envelope(1));
        store.append(envelope(2));
        assert_eq!(store.len(), 1);
        assert_eq!(seq_of(&store.current().unwrap()), 2);
    }

    #[test]
    fn empty_store_has_no_current() {
        let store = EnvelopeStore::history(4);
        assert!(store.current().is_none());
        assert!(store.is_empty());
        assert!(store.snapshot(Order::Insertion).is_empty());
    }

    #[test]
    fn concurrent_appends_all_land() {
        let store = Arc::new(EnvelopeStore::history(1024));
        let mut handles = Vec::new();
        for t in 0..8u64 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..64 {
                    store.append(envelope(t * 1000 + i));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 8 * 64);
        assert_eq!(store.total_appended(), 8 * 64);

        // Every envelope is whole: both arms of the record deserialize back.
        for e in store.snapshot(Order::Insertion) {
            assert!(e.payload.as_value().unwrap()["seq"].is_u64());
        }
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn zero_capacity_is_a_programming_error() {
        let _ = EnvelopeStore::history(0);
    }
}
