//! Cache Module
//!
//! Provides capacity-bounded in-memory storage with LRU eviction.

mod capacity;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use capacity::{Capacity, DEFAULT_CAPACITY};
pub use entry::CacheEntry;
pub use lru::{LruTracker, NodeIndex, OldestFirst};
pub use stats::CacheStats;
pub use store::CacheStore;
