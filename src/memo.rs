//! Memoization Module
//!
//! Puts a capacity-bounded LRU store between a caller and a deterministic
//! computation.
//!
//! A call first looks the key up; on a hit the stored value is returned and
//! the computation is not invoked. On a miss the computation runs, its result
//! is stored as most recently used, and the least recently used entry is
//! evicted if the store grew past capacity. A failed computation stores
//! nothing and its error reaches the caller untouched.

use std::convert::Infallible;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::cache::{CacheStats, CacheStore, Capacity};
use crate::error::{MemoError, Result};
use crate::key::{CallArgs, CallKey};

// == Memo Cache ==
/// Bounded memoizing cache with least-recently-used eviction.
///
/// Methods take `&mut self`; for use from several tasks at once see
/// [`SharedMemoCache`](crate::SharedMemoCache).
#[derive(Debug)]
pub struct MemoCache<K, V> {
    store: CacheStore<K, V>,
}

impl<K, V> MemoCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructors ==
    /// Creates a cache holding at most `max_entries` results.
    ///
    /// Zero disables caching: every call recomputes.
    pub fn new(max_entries: usize) -> Self {
        Self::with_capacity(Capacity::new(max_entries))
    }

    pub fn with_capacity(capacity: Capacity) -> Self {
        debug!(capacity = capacity.get(), "Memo cache created");
        Self {
            store: CacheStore::with_capacity(capacity),
        }
    }

    /// Creates a cache from a signed capacity, as received from an untyped
    /// source.
    ///
    /// # Errors
    /// `MemoError::Configuration` if `capacity` is negative.
    pub fn try_new(capacity: i64) -> Result<Self> {
        Ok(Self::with_capacity(Capacity::try_from(capacity)?))
    }

    // == Call ==
    /// Returns the memoized result for `key`, computing it on a miss.
    pub fn call<F>(&mut self, key: K, compute: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        match self.try_call(key, |key| Ok::<V, Infallible>(compute(key))) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Returns the memoized result for `key`, running a fallible computation
    /// on a miss.
    ///
    /// An error from `compute` is returned as-is and nothing is stored, so
    /// the next call with the same key runs the computation again.
    pub fn try_call<F, E>(&mut self, key: K, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce(&K) -> std::result::Result<V, E>,
    {
        if self.store.capacity().is_disabled() {
            self.store.record_pass_through();
            trace!("Caching disabled, calling through");
            return compute(&key);
        }

        if let Some(value) = self.store.get(&key) {
            trace!("Cache hit");
            return Ok(value.clone());
        }

        trace!("Cache miss, computing value");
        let value = compute(&key)?;

        if self.store.insert(key, value.clone()).is_some() {
            debug!(
                resident = self.store.len(),
                "Evicted least recently used result"
            );
        }
        Ok(value)
    }

    // == Inspection ==
    /// Returns a stored result without promoting it.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.store.peek(key)
    }

    /// Checks residency without promoting the key.
    pub fn contains(&self, key: &K) -> bool {
        self.store.contains(key)
    }

    /// Iterates resident keys from least to most recently used.
    pub fn keys_lru(&self) -> impl Iterator<Item = &K> + '_ {
        self.store.keys_lru()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    pub fn capacity(&self) -> Capacity {
        self.store.capacity()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // == Clear ==
    /// Drops every stored result. Capacity and statistics are kept.
    pub fn clear(&mut self) {
        debug!(dropped = self.store.len(), "Memo cache cleared");
        self.store.clear();
    }
}

impl<V: Clone> MemoCache<CallKey, V> {
    // == Call With Args ==
    /// Memoizes `compute` over dynamic call arguments.
    ///
    /// The arguments are normalized into a [`CallKey`] first; an argument
    /// that cannot be hashed fails the call with
    /// `MemoError::UnhashableKey`, converted into the computation's error
    /// type, before anything is looked up. With caching disabled no key is
    /// built at all.
    pub fn call_with_args<F, E>(&mut self, args: &CallArgs, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce(&CallArgs) -> std::result::Result<V, E>,
        E: From<MemoError>,
    {
        if self.store.capacity().is_disabled() {
            self.store.record_pass_through();
            trace!("Caching disabled, calling through");
            return compute(args);
        }

        let key = args.to_key()?;
        trace!(key = %key, "Normalized call arguments");
        self.try_call(key, |_| compute(args))
    }
}

// == Memoized ==
/// A computation bundled with its own memo cache.
///
/// Produced by [`wrap`]. Each wrapper owns its cache; two wrappers around
/// the same function share nothing.
#[derive(Debug)]
pub struct Memoized<F, V> {
    func: F,
    cache: MemoCache<CallKey, V>,
}

impl<F, V: Clone> Memoized<F, V> {
    pub fn new(func: F, capacity: Capacity) -> Self {
        Self {
            func,
            cache: MemoCache::with_capacity(capacity),
        }
    }

    // == Call ==
    /// Calls the wrapped computation through the cache.
    pub fn call<E>(&mut self, args: &CallArgs) -> std::result::Result<V, E>
    where
        F: FnMut(&CallArgs) -> std::result::Result<V, E>,
        E: From<MemoError>,
    {
        let func = &mut self.func;
        self.cache.call_with_args(args, |args| func(args))
    }

    /// Returns the cache owned by this wrapper.
    pub fn cache(&self) -> &MemoCache<CallKey, V> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Drops the cache and hands back the wrapped computation.
    pub fn into_inner(self) -> F {
        self.func
    }
}

// == Wrap ==
/// Wraps `func` in a memo cache holding at most `max_entries` results.
///
/// ```
/// use memo_lru::{wrap, CallArgs, MemoError};
///
/// let mut multiply = wrap(
///     |args: &CallArgs| -> Result<i64, MemoError> {
///         let a = args.get(0).and_then(|v| v.as_int()).unwrap_or(0);
///         let b = args.get(1).and_then(|v| v.as_int()).unwrap_or(0);
///         Ok(a * b)
///     },
///     3,
/// );
///
/// assert_eq!(multiply.call(&CallArgs::new().arg(3).arg(4)), Ok(12));
/// assert_eq!(multiply.stats().misses, 1);
/// ```
pub fn wrap<F, V, E>(func: F, max_entries: usize) -> Memoized<F, V>
where
    F: FnMut(&CallArgs) -> std::result::Result<V, E>,
    V: Clone,
    E: From<MemoError>,
{
    Memoized::new(func, Capacity::new(max_entries))
}

/// Like [`wrap`], taking a signed capacity.
///
/// # Errors
/// `MemoError::Configuration` if `capacity` is negative.
pub fn try_wrap<F, V, E>(func: F, capacity: i64) -> Result<Memoized<F, V>>
where
    F: FnMut(&CallArgs) -> std::result::Result<V, E>,
    V: Clone,
    E: From<MemoError>,
{
    Ok(Memoized::new(func, Capacity::try_from(capacity)?))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ArgValue;

    /// Returns scripted values in order, counting invocations.
    struct Scripted {
        values: Vec<i64>,
        calls: usize,
    }

    impl Scripted {
        fn new(values: &[i64]) -> Self {
            Self {
                values: values.to_vec(),
                calls: 0,
            }
        }

        fn next(&mut self) -> i64 {
            let value = self.values[self.calls];
            self.calls += 1;
            value
        }
    }

    fn args(values: &[i64]) -> CallArgs {
        CallArgs::positional_only(values.iter().copied())
    }

    #[test]
    fn test_hit_does_not_recompute() {
        let mut cache = MemoCache::new(4);
        let mut calls = 0;

        let first = cache.call(7, |k| {
            calls += 1;
            k * 2
        });
        let second = cache.call(7, |k| {
            calls += 1;
            k * 2
        });

        assert_eq!((first, second), (14, 14));
        assert_eq!(calls, 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut cache = MemoCache::new(2);

        cache.call("a", |_| 1);
        cache.call("b", |_| 2);
        cache.call("c", |_| 3);

        assert!(!cache.contains(&"a"));
        assert_eq!(cache.keys_lru().copied().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_recency_promotion() {
        let mut cache = MemoCache::new(2);

        cache.call("A", |_| 1);
        cache.call("B", |_| 2);
        assert_eq!(cache.call("A", |_| 100), 1);
        cache.call("C", |_| 3);

        assert!(cache.contains(&"A"));
        assert!(!cache.contains(&"B"));
    }

    #[test]
    fn test_evicted_key_is_recomputed() {
        let mut cache = MemoCache::new(1);
        let mut calls = 0;

        for key in [1, 2, 1] {
            cache.call(key, |k| {
                calls += 1;
                *k
            });
        }

        assert_eq!(calls, 3);
    }

    #[test]
    fn test_failed_computation_is_not_stored() {
        let mut cache: MemoCache<u32, u32> = MemoCache::new(2);

        let result: std::result::Result<u32, &str> = cache.try_call(1, |_| Err("boom"));
        assert_eq!(result, Err("boom"));
        assert!(cache.is_empty());

        let result: std::result::Result<u32, &str> = cache.try_call(1, |_| Ok(5));
        assert_eq!(result, Ok(5));
        assert_eq!(cache.peek(&1), Some(&5));
    }

    #[test]
    fn test_capacity_zero_always_computes() {
        let mut cache = MemoCache::new(0);
        let mut calls = 0;

        for _ in 0..3 {
            cache.call("k", |_| {
                calls += 1;
                calls
            });
        }

        assert_eq!(calls, 3);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 3);
    }

    #[test]
    fn test_try_new_rejects_negative() {
        let result: Result<MemoCache<u8, u8>> = MemoCache::try_new(-1);
        assert!(matches!(result, Err(MemoError::Configuration(_))));
    }

    #[test]
    fn test_largest_capacity_is_usable() {
        let mut cache: MemoCache<u8, u8> = MemoCache::try_new(i64::MAX).unwrap();

        assert_eq!(cache.call(1, |k| *k), 1);
        assert_eq!(cache.call(1, |_| 9), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_clear_forces_recompute() {
        let mut cache = MemoCache::new(2);
        let mut calls = 0;

        cache.call(1, |_| {
            calls += 1;
        });
        cache.clear();
        cache.call(1, |_| {
            calls += 1;
        });

        assert_eq!(calls, 2);
    }

    #[test]
    fn test_scripted_pairs_sequence() {
        let mut script = Scripted::new(&[1, 2, 3, 4]);
        let mut decorated = wrap(
            |_: &CallArgs| -> std::result::Result<i64, MemoError> { Ok(script.next()) },
            2,
        );

        let observed: Vec<i64> = [[1i64, 2], [1, 2], [3, 4], [3, 4], [5, 6], [5, 6], [1, 2]]
            .iter()
            .map(|pair| decorated.call(&args(pair)).unwrap())
            .collect();

        assert_eq!(observed, vec![1, 1, 2, 2, 3, 3, 4]);
        drop(decorated);
        assert_eq!(script.calls, 4);
    }

    #[test]
    fn test_scripted_single_key_sequence() {
        let mut script = Scripted::new(&[10, 20, 30, 40]);
        let mut decorated = wrap(
            |_: &CallArgs| -> std::result::Result<i64, MemoError> { Ok(script.next()) },
            2,
        );

        let observed: Vec<i64> = [1i64, 2, 1, 3, 1, 2]
            .iter()
            .map(|key| decorated.call(&args(&[*key])).unwrap())
            .collect();

        assert_eq!(observed, vec![10, 20, 10, 30, 10, 40]);
        drop(decorated);
        assert_eq!(script.calls, 4);
    }

    #[test]
    fn test_keyword_order_hits_same_entry() {
        let mut calls = 0;
        let mut sum_many = wrap(
            |args: &CallArgs| -> std::result::Result<i64, MemoError> {
                calls += 1;
                let positional: i64 = args.positional().iter().filter_map(ArgValue::as_int).sum();
                let keywords: i64 = args.keywords().filter_map(|(_, v)| v.as_int()).sum();
                Ok(positional + keywords)
            },
            128,
        );

        let first = CallArgs::new().arg(1).arg(2).kwarg("c", 3).kwarg("d", 4);
        let second = CallArgs::new().arg(1).arg(2).kwarg("d", 4).kwarg("c", 3);

        assert_eq!(sum_many.call(&first), Ok(10));
        assert_eq!(sum_many.call(&second), Ok(10));
        assert_eq!(sum_many.stats().hits, 1);
        drop(sum_many);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_unhashable_argument_is_rejected() {
        let mut decorated = wrap(|_: &CallArgs| -> std::result::Result<i64, MemoError> { Ok(0) }, 2);

        let result = decorated.call(&CallArgs::new().arg(ArgValue::List(vec![])));
        assert!(matches!(result, Err(MemoError::UnhashableKey(_))));
        assert!(decorated.cache().is_empty());
    }

    #[test]
    fn test_unhashable_argument_passes_through_when_disabled() {
        let mut decorated = wrap(|_: &CallArgs| -> std::result::Result<i64, MemoError> { Ok(9) }, 0);

        let result = decorated.call(&CallArgs::new().arg(ArgValue::List(vec![])));
        assert_eq!(result, Ok(9));
    }

    #[test]
    fn test_try_wrap_rejects_negative() {
        let result = try_wrap(|_: &CallArgs| -> std::result::Result<i64, MemoError> { Ok(0) }, -3);
        assert!(matches!(result, Err(MemoError::Configuration(_))));
    }
}
