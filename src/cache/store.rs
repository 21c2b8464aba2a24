//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use tracing::trace;

use crate::cache::{CacheEntry, CacheStats, Capacity, LruTracker};

/// Upper bound on slots reserved up front. Larger stores grow on insert.
const MAX_PREALLOCATED: usize = 1024;

// == Cache Store ==
/// Capacity-bounded storage with LRU eviction.
///
/// Every resident key has exactly one slot in the LRU tracker, and the
/// number of resident keys never exceeds the capacity once a method returns.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: Capacity,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new CacheStore holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self::with_capacity(Capacity::new(max_entries))
    }

    /// Creates a new CacheStore from an already validated capacity.
    pub fn with_capacity(capacity: Capacity) -> Self {
        let reserved = capacity.get().min(MAX_PREALLOCATED);
        Self {
            entries: HashMap::with_capacity(reserved),
            lru: LruTracker::with_capacity(reserved),
            stats: CacheStats::new(capacity.get()),
            capacity,
        }
    }

    // == Get ==
    /// Looks up a key, promoting it to most recently used on a hit.
    ///
    /// Records a hit or a miss in the statistics.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(entry) = self.entries.get(key) {
            self.lru.touch(entry.node);
            self.stats.record_hit();
            Some(&entry.value)
        } else {
            self.stats.record_miss();
            None
        }
    }

    // == Peek ==
    /// Returns the value for a key without touching recency or statistics.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(CacheEntry::value)
    }

    /// Checks residency without promoting the key.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    // == Insert ==
    /// Stores a freshly computed value as the most recently used entry.
    ///
    /// If the key is already resident (a concurrent caller got there first),
    /// the value is replaced and the key promoted without growing the store.
    /// Otherwise, once the store exceeds capacity, exactly one entry is
    /// evicted: the least recently used one. Returns the evicted key.
    ///
    /// With a disabled capacity nothing is stored.
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        if self.capacity.is_disabled() {
            return None;
        }

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            self.lru.touch(entry.node);
            return None;
        }

        let node = self.lru.push_front(key.clone());
        self.entries.insert(key, CacheEntry::new(value, node));

        let evicted = if self.entries.len() > self.capacity.get() {
            let Some(oldest) = self.lru.evict_oldest() else {
                panic!("LRU tracker is empty while the store holds entries");
            };
            let removed = self.entries.remove(&oldest);
            assert!(removed.is_some(), "evicted key was not resident in the store");
            self.stats.record_eviction();
            trace!(capacity = self.capacity.get(), "Evicted least recently used entry");
            Some(oldest)
        } else {
            None
        };

        assert!(
            self.entries.len() <= self.capacity.get(),
            "store holds {} entries, capacity is {}",
            self.entries.len(),
            self.capacity
        );
        assert_eq!(
            self.entries.len(),
            self.lru.len(),
            "recency order out of sync with the store"
        );

        self.stats.set_total_entries(self.entries.len());
        evicted
    }

    // == Record Miss ==
    /// Counts a call that bypassed the store entirely.
    pub fn record_pass_through(&mut self) {
        self.stats.record_miss();
    }

    // == Clear ==
    /// Drops every entry. Capacity and counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
    }

    // == Keys ==
    /// Iterates resident keys from least to most recently used.
    pub fn keys_lru(&self) -> impl Iterator<Item = &K> + '_ {
        self.lru.iter_oldest_first()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
