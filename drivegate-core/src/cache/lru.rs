//! LRU (Least Recently Used) cache with per-entry expiry
//!
//! Recency is tracked with a monotonically increasing tick: each entry
//! remembers the tick of its last use and a `BTreeMap` orders ticks, so the
//! oldest entry is always the first key of that map.

use super::traits::{Cache, CacheEntry};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::Duration;

pub struct LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    capacity: usize,
    entries: HashMap<K, (CacheEntry<V>, u64)>,
    order: BTreeMap<u64, K>,
    tick: u64,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, entries: HashMap::with_capacity(capacity), order: BTreeMap::new(), tick: 0 }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Mark `key` as most recently used
    fn promote(&mut self, key: &K) {
        let tick = self.next_tick();
        if let Some((_, last_used)) = self.entries.get_mut(key) {
            self.order.remove(&*last_used);
            *last_used = tick;
            self.order.insert(tick, key.clone());
        }
    }

    fn evict_lru(&mut self) -> Option<(K, V)> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key).map(|(entry, _)| (key, entry.value))
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        let expired = self.entries.get(key)?.0.is_expired();
        if expired {
            self.remove(key);
            return None;
        }
        self.promote(key);
        let (entry, _) = self.entries.get_mut(key)?;
        entry.hits += 1;
        Some(&entry.value)
    }

    fn insert(&mut self, key: K, value: V, ttl: Duration) -> Option<V> {
        let previous = self.remove(&key);
        if self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        let tick = self.next_tick();
        self.order.insert(tick, key.clone());
        self.entries.insert(key, (CacheEntry::new(value, ttl), tick));
        previous
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let (entry, tick) = self.entries.remove(key)?;
        self.order.remove(&tick);
        Some(entry.value)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: Duration = Duration::from_secs(3600);

    #[test]
    fn test_lru_basic_operations() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1, LONG);
        cache.insert("b", 2, LONG);
        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_eviction_prefers_least_recent() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1, LONG);
        cache.insert("b", 2, LONG);
        // touch a so b becomes the oldest
        assert_eq!(cache.get(&"a"), Some(&1));
        cache.insert("c", 3, LONG);
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn test_lru_update_existing() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1, LONG);
        assert_eq!(cache.insert("a", 10, LONG), Some(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a"), Some(&10));
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let mut cache = LruCache::new(4);
        cache.insert("gone", 1, Duration::ZERO);
        cache.insert("kept", 2, LONG);
        assert_eq!(cache.get(&"gone"), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"kept"), Some(&2));
    }

    #[test]
    fn test_lru_remove_and_clear() {
        let mut cache = LruCache::new(3);
        cache.insert(1, "x", LONG);
        cache.insert(2, "y", LONG);
        assert_eq!(cache.remove(&1), Some("x"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
