//! Error types for the memoizing cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Memo Error Enum ==
/// Unified error type for cache construction and key building.
///
/// Failures of the wrapped computation are never wrapped in this type; they
/// travel back to the caller in the computation's own error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoError {
    /// Capacity is negative, not an integer, or otherwise unusable
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// An argument cannot be hashed or compared, so it cannot be part of a key
    #[error("Unhashable argument: {0}")]
    UnhashableKey(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, MemoError>;
