//! Shared drive sessions
//!
//! Opening a drive means finding peers, so sessions are kept across
//! requests. Concurrent requests for the same key wait on one load instead
//! of each starting their own.

use super::{ArchiveSession, ArchiveStore, StoreError};
use crate::key::ContentKey;
use scc::HashMap as SccHashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

type SessionSlot = Arc<OnceCell<Arc<dyn ArchiveSession>>>;

/// Key-addressed cache of open sessions
pub struct SessionCache {
    store: Arc<dyn ArchiveStore>,
    sessions: SccHashMap<ContentKey, SessionSlot>,
}

impl SessionCache {
    pub fn new(store: Arc<dyn ArchiveStore>) -> Self {
        Self { store, sessions: SccHashMap::new() }
    }

    /// Return the session for `key`, opening it if nobody has yet.
    ///
    /// A failed open leaves nothing behind, so the next request tries again.
    pub async fn get_or_load(&self, key: ContentKey) -> Result<Arc<dyn ArchiveSession>, StoreError> {
        let slot: SessionSlot = self
            .sessions
            .entry_async(key)
            .await
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .get()
            .clone();

        let result = slot.get_or_try_init(|| self.store.load_archive(key)).await.cloned();

        if result.is_err() {
            self.sessions
                .remove_if_async(&key, |current| Arc::ptr_eq(current, &slot) && current.get().is_none())
                .await;
        }
        result
    }

    /// Already-open session, without loading
    pub async fn get(&self, key: &ContentKey) -> Option<Arc<dyn ArchiveSession>> {
        self.sessions.read_async(key, |_, slot| slot.get().cloned()).await.flatten()
    }

    /// Forget a session; the next request for it reopens
    pub async fn evict(&self, key: &ContentKey) -> bool {
        self.sessions.remove_async(key).await.is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{CheckoutFs, MemoryStore};
    use crate::url::Version;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts loads; fails the first `fail_first` of them
    struct SlowStore {
        inner: MemoryStore,
        loads: AtomicUsize,
        fail_first: usize,
    }

    #[async_trait]
    impl ArchiveStore for SlowStore {
        async fn load_archive(
            &self,
            key: ContentKey,
        ) -> Result<Arc<dyn ArchiveSession>, StoreError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if n < self.fail_first {
                return Err(StoreError::Other("no peers".into()));
            }
            self.inner.load_archive(key).await
        }
    }

    fn slow_store(fail_first: usize) -> (Arc<SlowStore>, ContentKey) {
        let inner = MemoryStore::new();
        let key = ContentKey::derive("site");
        inner.publish(key, vec![("/index.html".to_string(), "hi".into())]);
        (Arc::new(SlowStore { inner, loads: AtomicUsize::new(0), fail_first }), key)
    }

    #[tokio::test]
    async fn test_concurrent_loads_converge() {
        let (store, key) = slow_store(0);
        let cache = Arc::new(SessionCache::new(store.clone()));

        let a = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get_or_load(key).await.map(|s| s.key()) }
        });
        let b = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get_or_load(key).await.map(|s| s.key()) }
        });

        assert_eq!(a.await.unwrap().unwrap(), key);
        assert_eq!(b.await.unwrap().unwrap(), key);
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let (store, key) = slow_store(1);
        let cache = SessionCache::new(store.clone());

        assert!(cache.get_or_load(key).await.is_err());
        assert!(cache.is_empty());
        let session = cache.get_or_load(key).await.unwrap();
        let view: Arc<dyn CheckoutFs> = session.checkout(None::<&Version>).await.unwrap();
        assert_eq!(view.read_file("/index.html").await.unwrap(), "hi");
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_evict_forces_reload() {
        let (store, key) = slow_store(0);
        let cache = SessionCache::new(store.clone());
        cache.get_or_load(key).await.unwrap();
        assert!(cache.get(&key).await.is_some());
        assert!(cache.evict(&key).await);
        assert!(cache.get(&key).await.is_none());
        cache.get_or_load(key).await.unwrap();
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }
}
