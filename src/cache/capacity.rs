//! Capacity Module
//!
//! Validated, immutable bound on the number of resident entries.

use std::fmt;
use std::str::FromStr;

use crate::error::MemoError;

// == Public Constants ==
/// Bound used when none is configured
pub const DEFAULT_CAPACITY: usize = 128;

// == Capacity ==
/// Maximum number of entries a cache may hold.
///
/// Zero is valid and disables caching entirely: every call recomputes and
/// nothing is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capacity(usize);

impl Capacity {
    pub const fn new(max_entries: usize) -> Self {
        Self(max_entries)
    }

    pub const fn get(self) -> usize {
        self.0
    }

    /// Returns true when the cache should pass every call straight through.
    pub const fn is_disabled(self) -> bool {
        self.0 == 0
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self(DEFAULT_CAPACITY)
    }
}

impl From<usize> for Capacity {
    fn from(max_entries: usize) -> Self {
        Self(max_entries)
    }
}

impl TryFrom<i64> for Capacity {
    type Error = MemoError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value).map(Self).map_err(|_| {
            MemoError::Configuration(format!(
                "capacity must be a non-negative integer, got {}",
                value
            ))
        })
    }
}

impl FromStr for Capacity {
    type Err = MemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed.parse().map_err(|_| {
            MemoError::Configuration(format!(
                "capacity must be a non-negative integer, got '{}'",
                trimmed
            ))
        })?;
        Self::try_from(value)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
