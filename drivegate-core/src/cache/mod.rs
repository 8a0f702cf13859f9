//! Bounded caches
//!
//! Used by the name resolver to remember recent lookups, both successful
//! ones and misses, each with its own time-to-live.

pub mod lru;
pub mod traits;

pub use lru::LruCache;
pub use traits::{Cache, CacheEntry};
