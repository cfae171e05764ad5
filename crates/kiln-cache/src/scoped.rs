//! Lazily populated cache with explicit invalidation, backed by moka.

use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use kiln_core::result::AppResult;

/// A cache whose entries are loaded on first use and kept until
/// [`ScopedCache::invalidate_all`] (or an optional time-to-live) clears them.
///
/// Concurrent first loads of the same key run the loader once; the other
/// callers wait and receive the same value.
#[derive(Debug, Clone)]
pub struct ScopedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Cache name, used in log lines.
    name: &'static str,
    /// The underlying moka cache.
    inner: Cache<K, V>,
}

impl<K, V> ScopedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache. A `ttl` of zero keeps entries until invalidated.
    pub fn new(name: &'static str, max_capacity: u64, ttl: Duration) -> Self {
        let mut builder = Cache::builder().max_capacity(max_capacity);
        if !ttl.is_zero() {
            builder = builder.time_to_live(ttl);
        }
        Self {
            name,
            inner: builder.build(),
        }
    }

    /// Return the cached value, or run `load` to populate it.
    ///
    /// A failed load leaves the key empty so the next call retries.
    pub async fn get_or_try_load<F>(&self, key: K, load: F) -> AppResult<V>
    where
        F: Future<Output = AppResult<V>>,
    {
        self.inner
            .try_get_with(key, async {
                debug!(cache = self.name, "Populating cache entry");
                load.await
            })
            .await
            .map_err(|e| (*e).clone())
    }

    /// Return the cached value without loading.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    /// Store a value directly.
    pub async fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value).await;
    }

    /// Drop one entry.
    pub async fn invalidate(&self, key: &K) {
        self.inner.invalidate(key).await;
    }

    /// Drop every entry; the next lookup repopulates.
    pub fn invalidate_all(&self) {
        debug!(cache = self.name, "Invalidating cache");
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use kiln_core::AppError;

    fn cache() -> ScopedCache<&'static str, u32> {
        ScopedCache::new("test", 16, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_loads_once() {
        let cache = cache();
        let loads = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let loads = loads.clone();
            let value = cache
                .get_or_try_load("k", async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_all_forces_reload() {
        let cache = cache();
        cache.get_or_try_load("k", async { Ok(1) }).await.unwrap();
        cache.invalidate_all();
        assert_eq!(cache.get(&"k").await, None);
        let value = cache.get_or_try_load("k", async { Ok(2) }).await.unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = cache();
        let err = cache
            .get_or_try_load("k", async { Err(AppError::database("offline")) })
            .await
            .unwrap_err();
        assert_eq!(err.message, "offline");
        let value = cache.get_or_try_load("k", async { Ok(3) }).await.unwrap();
        assert_eq!(value, 3);
    }
}
