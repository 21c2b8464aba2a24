//! Shared Memo Cache
//!
//! A memo cache that many tasks can call concurrently.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::cache::{CacheStats, CacheStore, Capacity};
use crate::error::{MemoError, Result};
use crate::key::{CallArgs, CallKey};

// == Shared Memo Cache ==
/// Thread-safe handle to a bounded memo cache.
///
/// Lookup, promotion, insertion and eviction each run under one mutex scoped
/// to this cache. The computation itself runs with the lock released, so a
/// slow or suspending computation never blocks hits on other keys.
/// Bookkeeping is atomic; the computation is the only step outside the lock.
///
/// Concurrent misses on the same key are not coalesced: each caller runs the
/// computation, and the later insert replaces the earlier value without
/// growing the store.
///
/// Cloning the handle shares the same underlying cache.
pub struct SharedMemoCache<K, V> {
    inner: Arc<Mutex<CacheStore<K, V>>>,
}

impl<K, V> Clone for SharedMemoCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedMemoCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructors ==
    /// Creates a shared cache holding at most `max_entries` results.
    pub fn new(max_entries: usize) -> Self {
        Self::with_capacity(Capacity::new(max_entries))
    }

    pub fn with_capacity(capacity: Capacity) -> Self {
        debug!(capacity = capacity.get(), "Shared memo cache created");
        Self {
            inner: Arc::new(Mutex::new(CacheStore::with_capacity(capacity))),
        }
    }

    /// # Errors
    /// `MemoError::Configuration` if `capacity` is negative.
    pub fn try_new(capacity: i64) -> Result<Self> {
        Ok(Self::with_capacity(Capacity::try_from(capacity)?))
    }

    // == Call ==
    /// Returns the memoized result for `key`, awaiting `compute` on a miss.
    pub async fn call<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = V>,
    {
        let outcome: std::result::Result<V, std::convert::Infallible> = self
            .try_call(key, |key| async move { Ok(compute(key).await) })
            .await;
        match outcome {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Returns the memoized result for `key`, awaiting a fallible
    /// computation on a miss.
    ///
    /// An error from `compute` is returned as-is and nothing is stored.
    pub async fn try_call<F, Fut, E>(&self, key: K, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        let disabled = {
            let mut store = self.inner.lock().await;
            if store.capacity().is_disabled() {
                store.record_pass_through();
                true
            } else {
                if let Some(value) = store.get(&key) {
                    trace!("Cache hit");
                    return Ok(value.clone());
                }
                false
            }
        };

        if disabled {
            trace!("Caching disabled, calling through");
            return compute(key).await;
        }

        trace!("Cache miss, computing value with the lock released");
        let value = compute(key.clone()).await?;

        let mut store = self.inner.lock().await;
        if store.insert(key, value.clone()).is_some() {
            debug!(resident = store.len(), "Evicted least recently used result");
        }
        Ok(value)
    }

    // == Inspection ==
    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    /// Checks residency without promoting the key.
    pub async fn contains(&self, key: &K) -> bool {
        self.inner.lock().await.contains(key)
    }

    /// Snapshot of resident keys from least to most recently used.
    pub async fn keys_lru(&self) -> Vec<K> {
        self.inner.lock().await.keys_lru().cloned().collect()
    }

    pub async fn capacity(&self) -> Capacity {
        self.inner.lock().await.capacity()
    }

    /// Drops every stored result. Capacity and statistics are kept.
    pub async fn clear(&self) {
        let mut store = self.inner.lock().await;
        debug!(dropped = store.len(), "Shared memo cache cleared");
        store.clear();
    }
}

impl<V: Clone> SharedMemoCache<CallKey, V> {
    // == Call With Args ==
    /// Memoizes `compute` over dynamic call arguments.
    ///
    /// Unhashable arguments fail the call with `MemoError::UnhashableKey`
    /// unless caching is disabled, in which case no key is built.
    pub async fn call_with_args<F, Fut, E>(
        &self,
        args: CallArgs,
        compute: F,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce(CallArgs) -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
        E: From<MemoError>,
    {
        let disabled = {
            let mut store = self.inner.lock().await;
            if store.capacity().is_disabled() {
                store.record_pass_through();
                true
            } else {
                false
            }
        };

        if disabled {
            trace!("Caching disabled, calling through");
            return compute(args).await;
        }

        let key = args.to_key()?;
        trace!(key = %key, "Normalized call arguments");
        self.try_call(key, |_| compute(args)).await
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    #[tokio::test]
    async fn test_shared_hit_skips_computation() {
        let cache = SharedMemoCache::new(4);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .call(5u64, |k| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { k * k }
                })
                .await;
            assert_eq!(value, 25);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().await.hits, 2);
    }

    #[tokio::test]
    async fn test_shared_eviction_order() {
        let cache = SharedMemoCache::new(2);

        cache.call("a", |_| async { 1 }).await;
        cache.call("b", |_| async { 2 }).await;
        // Hit: the stored value wins over what the computation would return
        assert_eq!(cache.call("a", |_| async { 100 }).await, 1);
        cache.call("c", |_| async { 3 }).await;

        assert_eq!(cache.keys_lru().await, vec!["a", "c"]);
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_shared_failed_computation_is_not_stored() {
        let cache: SharedMemoCache<u8, u8> = SharedMemoCache::new(2);

        let result = cache.try_call(1, |_| async { Err::<u8, _>("down") }).await;
        assert_eq!(result, Err("down"));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_shared_capacity_zero_passes_through() {
        let cache = SharedMemoCache::new(0);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            cache
                .call(1u8, |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { 0u8 }
                })
                .await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_misses_are_not_coalesced() {
        let cache: SharedMemoCache<u32, u32> = SharedMemoCache::new(4);
        let barrier = Arc::new(Barrier::new(2));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let cache = cache.clone();
            let barrier = Arc::clone(&barrier);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .call(7, |k| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        // Both computations must be in flight at once
                        barrier.wait().await;
                        k + 1
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 8);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_shared_call_with_args() {
        let cache: SharedMemoCache<CallKey, i64> = SharedMemoCache::new(2);

        let args = CallArgs::new().arg(2).kwarg("power", 10);
        let result: std::result::Result<i64, MemoError> = cache
            .call_with_args(args.clone(), |args| async move {
                let base = args.get(0).and_then(|v| v.as_int()).unwrap_or(0);
                let power = args.keyword("power").and_then(|v| v.as_int()).unwrap_or(1);
                Ok(base.pow(power as u32))
            })
            .await;
        assert_eq!(result, Ok(1024));

        let unhashable = CallArgs::new().arg(crate::key::ArgValue::List(vec![]));
        let result: std::result::Result<i64, MemoError> = cache
            .call_with_args(unhashable, |_| async { Ok(0) })
            .await;
        assert!(matches!(result, Err(MemoError::UnhashableKey(_))));
        assert_eq!(cache.len().await, 1);
    }
}
