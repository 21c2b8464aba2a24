//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;

use crate::cache::Capacity;
use crate::error::{MemoError, Result};

// == Defaults ==
const DEFAULT_WORKERS: usize = 4;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of memoized results per cache
    pub capacity: Capacity,
    /// Number of concurrent tasks the demo drives against a shared cache
    pub workers: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMO_CAPACITY` - Cache capacity, 0 disables caching (default: 128)
    /// - `MEMO_WORKERS` - Concurrent demo tasks, at least 1 (default: 4)
    ///
    /// Unset variables fall back to defaults; set but malformed ones are
    /// rejected.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let capacity = match lookup("MEMO_CAPACITY") {
            Some(raw) => raw.parse::<Capacity>()?,
            None => Capacity::default(),
        };

        let workers = match lookup("MEMO_WORKERS") {
            Some(raw) => parse_workers(&raw)?,
            None => DEFAULT_WORKERS,
        };

        Ok(Self { capacity, workers })
    }
}

fn parse_workers(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(workers) if workers > 0 => Ok(workers),
        _ => Err(MemoError::Configuration(format!(
            "MEMO_WORKERS must be a positive integer, got '{}'",
            raw.trim()
        ))),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: Capacity::default(),
            workers: DEFAULT_WORKERS,
        }
    }
}
