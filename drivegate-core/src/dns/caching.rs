//! Lookup caching in front of a slower resolver

use super::{NameResolver, ResolveError, ResolveOptions};
use crate::cache::{Cache, LruCache};
use crate::key::ContentKey;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_POSITIVE_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_NEGATIVE_TTL: Duration = Duration::from_secs(60);

/// Remembers hits and misses of an inner resolver.
///
/// A remembered miss is only honoured when the caller does not set
/// [`ResolveOptions::ignore_cached_miss`]; remembered hits are always used.
pub struct CachingResolver {
    inner: Arc<dyn NameResolver>,
    // Some(key) = hit, None = miss
    cache: Mutex<LruCache<String, Option<ContentKey>>>,
    positive_ttl: Duration,
    negative_ttl: Duration,
}

impl CachingResolver {
    pub fn new(inner: Arc<dyn NameResolver>, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
            positive_ttl: DEFAULT_POSITIVE_TTL,
            negative_ttl: DEFAULT_NEGATIVE_TTL,
        }
    }

    pub fn with_ttls(mut self, positive: Duration, negative: Duration) -> Self {
        self.positive_ttl = positive;
        self.negative_ttl = negative;
        self
    }

    fn cached(&self, host: &str) -> Option<Option<ContentKey>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(&host.to_string()).copied()
    }

    fn remember(&self, host: &str, value: Option<ContentKey>) {
        let ttl = if value.is_some() { self.positive_ttl } else { self.negative_ttl };
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(host.to_string(), value, ttl);
    }
}

#[async_trait]
impl NameResolver for CachingResolver {
    async fn resolve(&self, host: &str, opts: ResolveOptions) -> Result<ContentKey, ResolveError> {
        let host = host.to_ascii_lowercase();
        match self.cached(&host) {
            Some(Some(key)) => return Ok(key),
            Some(None) if !opts.ignore_cached_miss => {
                return Err(ResolveError::NotFound(host));
            }
            _ => {}
        }

        match self.inner.resolve(&host, opts).await {
            Ok(key) => {
                self.remember(&host, Some(key));
                Ok(key)
            }
            Err(ResolveError::NotFound(name)) => {
                self.remember(&host, None);
                Err(ResolveError::NotFound(name))
            }
            // Transient failures are not remembered
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Fails until `online` is flipped, counting every call
    struct Flaky {
        online: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NameResolver for Flaky {
        async fn resolve(&self, host: &str, _: ResolveOptions) -> Result<ContentKey, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.online.load(Ordering::SeqCst) {
                Ok(ContentKey::derive(host))
            } else {
                Err(ResolveError::NotFound(host.to_string()))
            }
        }
    }

    fn flaky() -> Arc<Flaky> {
        Arc::new(Flaky { online: AtomicBool::new(false), calls: AtomicUsize::new(0) })
    }

    #[tokio::test]
    async fn test_cached_miss_is_honoured_by_default() {
        let inner = flaky();
        let resolver = CachingResolver::new(inner.clone(), 16);
        let plain = ResolveOptions::default();

        assert!(resolver.resolve("site", plain).await.is_err());
        inner.online.store(true, Ordering::SeqCst);
        assert!(resolver.resolve("site", plain).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ignore_cached_miss_retries() {
        let inner = flaky();
        let resolver = CachingResolver::new(inner.clone(), 16);
        let retry = ResolveOptions { ignore_cached_miss: true };

        assert!(resolver.resolve("site", retry).await.is_err());
        inner.online.store(true, Ordering::SeqCst);
        let key = resolver.resolve("site", retry).await.unwrap();
        assert_eq!(key, ContentKey::derive("site"));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cached_hit_is_used_even_when_ignoring_misses() {
        let inner = flaky();
        inner.online.store(true, Ordering::SeqCst);
        let resolver = CachingResolver::new(inner.clone(), 16);
        let retry = ResolveOptions { ignore_cached_miss: true };

        resolver.resolve("site", retry).await.unwrap();
        resolver.resolve("SITE", retry).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
