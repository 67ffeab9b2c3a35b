// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity, status, and descriptor types.
//!
//! An AgentId names one registration lifetime of an agent process. The
//! descriptor is what the agent publishes to the directory and what a
//! broker gets back from a lookup.

use std::borrow::Borrow;
use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::entries::Entries;

/// Unique identifier for an agent process's registration lifetime.
///
/// Assigned when the agent constructs its descriptor; opaque to
/// consumers and not persisted across agent restarts. Format is
/// `agt-{nanoid}`, 23 characters total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(SmolStr);

impl AgentId {
    pub const PREFIX: &'static str = "agt-";

    /// Generate a new random id with the type prefix.
    pub fn new() -> Self {
        Self(SmolStr::new(format!("{}{}", Self::PREFIX, nanoid::nanoid!(19))))
    }

    /// Create an id from an existing string (parsing/deserialization).
    pub fn from_string(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id without its type prefix.
    pub fn suffix(&self) -> &str {
        self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
    }

    /// Suffix truncated to at most `n` characters, for display.
    pub fn short(&self, n: usize) -> &str {
        let suffix = self.suffix();
        &suffix[..n.min(suffix.len())]
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Busy/idle status as observed by a point-in-time read.
///
/// A read is not a reservation: an agent observed `Available` may be
/// claimed by another master before this one acts on the observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Available,
    Busy,
}

impl AgentStatus {
    pub fn from_busy(busy: bool) -> Self {
        if busy {
            AgentStatus::Busy
        } else {
            AgentStatus::Available
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Available => write!(f, "available"),
            AgentStatus::Busy => write!(f, "busy"),
        }
    }
}

/// A registered agent: where to reach it and what it advertises.
///
/// Immutable per registration. An agent that re-registers with changed
/// entries replaces its previous registration wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: AgentId,
    pub addr: SocketAddr,
    pub entries: Entries,
}

impl AgentDescriptor {
    /// Descriptor for a freshly started agent with a new identity.
    pub fn new(addr: SocketAddr, entries: Entries) -> Self {
        Self { id: AgentId::new(), addr, entries }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
