//! Core traits for caching functionality

use std::hash::Hash;
use std::time::{Duration, Instant};

/// A cache entry with metadata
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,

    /// When this entry was stored
    pub created_at: Instant,

    /// How long the entry stays valid
    pub ttl: Duration,

    /// Number of times this entry has been read
    pub hits: u64,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: Duration) -> Self {
        Self { value, created_at: Instant::now(), ttl, hits: 0 }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// Core caching trait
pub trait Cache<K, V>
where
    K: Hash + Eq,
{
    /// Get a live value, dropping it first if it has expired
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Insert a value valid for `ttl`, returning the value it replaced
    fn insert(&mut self, key: K, value: V, ttl: Duration) -> Option<V>;

    fn remove(&mut self, key: &K) -> Option<V>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;
}
