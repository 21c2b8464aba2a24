//! Cache Entry Module
//!
//! Defines the structure for individual memoized results.

use crate::cache::lru::NodeIndex;

// == Cache Entry ==
/// A memoized value plus its position in the recency order.
///
/// The value is never mutated after insertion; only the recency position
/// changes as the key is hit.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored result
    pub value: V,
    /// Slot of the key in the LRU tracker
    pub(crate) node: NodeIndex,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    pub(crate) fn new(value: V, node: NodeIndex) -> Self {
        Self { value, node }
    }

    /// Returns a reference to the stored value.
    pub fn value(&self) -> &V {
        &self.value
    }
}
