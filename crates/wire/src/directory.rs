// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote calls against a service directory.
//!
//! Registrations carry their lease TTL; a registration that is not
//! renewed within its TTL is evicted by the directory. Lookup is a
//! single call with no retry logic on either side.

use bf_core::{AgentDescriptor, AgentId, Entries};
use serde::{Deserialize, Serialize};

/// Request from an agent or master to a directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DirectoryRequest {
    /// Health check ping (also used by discovery probes)
    Ping,

    /// Publish a descriptor with a fresh lease
    Register { descriptor: AgentDescriptor, ttl_ms: u64 },

    /// Extend an existing lease
    Renew { id: AgentId, ttl_ms: u64 },

    /// Withdraw a registration ahead of its lease expiry
    Deregister { id: AgentId },

    /// All live registrations matching the filter
    Lookup { filter: Entries },
}

/// Response from a directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DirectoryResponse {
    Pong,

    Registered,

    Renewed,

    /// Renew target is not registered (lease already expired, or the
    /// directory restarted). The agent should register again.
    UnknownRegistration,

    Deregistered,

    /// Lookup result; empty when nothing matches
    Matches { agents: Vec<AgentDescriptor> },

    Error { message: String },
}

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;
