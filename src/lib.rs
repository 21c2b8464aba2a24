//! Memo LRU - A bounded memoizing cache
//!
//! Wraps deterministic computations with a fixed-capacity store of past
//! results, evicting the least recently used result when full.

pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod memo;
pub mod shared;

pub use cache::{CacheStats, Capacity};
pub use config::Config;
pub use error::MemoError;
pub use key::{ArgValue, CallArgs, CallKey, KeyPart};
pub use memo::{try_wrap, wrap, MemoCache, Memoized};
pub use shared::SharedMemoCache;
