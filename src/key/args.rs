//! Call Arguments and Keys
//!
//! Builds the normalized cache key for a call from its positional and
//! keyword arguments.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MemoError, Result};
use crate::key::{ArgValue, KeyPart};

// == Call Args ==
/// The arguments of one call to a memoized computation.
///
/// Keyword arguments are kept sorted by name, so the order in which they
/// are supplied never affects the resulting key. Supplying the same keyword
/// twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<ArgValue>,
    keywords: BTreeMap<String, ArgValue>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an argument list from positional values only.
    pub fn positional_only<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ArgValue>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            keywords: BTreeMap::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    // == Accessors ==
    pub fn positional(&self) -> &[ArgValue] {
        &self.positional
    }

    /// Returns the positional argument at `index`.
    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.positional.get(index)
    }

    /// Returns the keyword argument called `name`.
    pub fn keyword(&self, name: &str) -> Option<&ArgValue> {
        self.keywords.get(name)
    }

    /// Iterates keyword arguments in name order.
    pub fn keywords(&self) -> impl Iterator<Item = (&str, &ArgValue)> + '_ {
        self.keywords.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn has_keywords(&self) -> bool {
        !self.keywords.is_empty()
    }

    // == Key Construction ==
    /// Normalizes the arguments into a cache key.
    ///
    /// The key is the positional parts followed by one `Keyword` part per
    /// keyword argument in name order. Without keyword arguments the key is
    /// exactly the positional parts.
    pub fn to_key(&self) -> Result<CallKey> {
        let mut parts = Vec::with_capacity(self.positional.len() + self.keywords.len());

        for (index, value) in self.positional.iter().enumerate() {
            let part = value.to_key_part().map_err(|err| match err {
                MemoError::UnhashableKey(reason) => {
                    MemoError::UnhashableKey(format!("positional argument {}: {}", index, reason))
                }
                other => other,
            })?;
            parts.push(part);
        }

        for (name, value) in &self.keywords {
            let part = value.to_key_part().map_err(|err| match err {
                MemoError::UnhashableKey(reason) => {
                    MemoError::UnhashableKey(format!("keyword argument '{}': {}", name, reason))
                }
                other => other,
            })?;
            parts.push(KeyPart::Keyword(name.clone(), Box::new(part)));
        }

        Ok(CallKey(parts))
    }
}

// == Call Key ==
/// Normalized, hashable identity of a call.
///
/// Built only through [`CallArgs::to_key`], so keyword parts are always in
/// name order. Equality is strict about types: `1`, `1.0` and `true` are
/// three different keys, unlike languages where they compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallKey(Vec<KeyPart>);

impl CallKey {
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, ")")
    }
}
