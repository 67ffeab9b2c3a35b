// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attribute entries: the key-value map an agent advertises and the
//! filter a caller selects agents with.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered string-to-string attribute map.
///
/// One type serves both sides of a lookup: an agent registers its
/// entries, and a caller selects with a filter. Filter matching is
/// exact string equality on every key present in the filter; keys the
/// filter does not mention are wildcards. The empty filter therefore
/// matches every candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entries(IndexMap<String, String>);

impl Entries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, for literals in config and tests.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert an entry, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Filter semantics: every entry in `self` must be present in
    /// `candidate` with an equal value.
    pub fn matches(&self, candidate: &Entries) -> bool {
        self.0.iter().all(|(k, v)| candidate.get(k) == Some(v.as_str()))
    }

    /// Parse `key=value` pairs, as given on a command line.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, EntryParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = Entries::new();
        for pair in pairs {
            let pair = pair.as_ref();
            match pair.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    entries.insert(key, value);
                }
                _ => return Err(EntryParseError(pair.to_string())),
            }
        }
        Ok(entries)
    }
}

impl fmt::Display for Entries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        Ok(())
    }
}

/// A `key=value` pair that did not parse.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid entry '{0}': expected key=value")]
pub struct EntryParseError(pub String);

#[cfg(test)]
#[path = "entries_tests.rs"]
mod tests;
