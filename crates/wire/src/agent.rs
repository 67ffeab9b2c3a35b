// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote calls a master issues against an agent endpoint.
//!
//! Every request is a single frame. Every request except `Build` gets a
//! single response frame. `Build` answers with a stream: zero or more
//! `Progress` frames followed by one `BuildFinished` or `BuildFailed`.

use std::collections::HashMap;

use bf_core::{AgentDescriptor, BuildRequest, OutputFile};
use serde::{Deserialize, Serialize};

/// Request from a master to an agent endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum AgentRequest {
    /// Health check ping
    Ping,

    /// The agent's registration descriptor
    Describe,

    /// Point-in-time busy read. Not a reservation.
    IsBusy,

    /// Idempotent set of the busy flag; no prior-state return.
    Claim,

    /// Compare-and-set claim: reports whether this caller won the flag.
    TryClaim,

    /// Run a build on the (already claimed) agent
    Build { request: BuildRequest },

    /// Report properties of the last finished build
    Results,

    /// The output files held since the last finished build
    FetchOutputs,

    /// Delete held outputs and release the busy flag.
    /// The only operation that returns an agent to the idle pool.
    ClearOutputs,
}

/// Response from an agent endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum AgentResponse {
    Pong,

    Descriptor { descriptor: AgentDescriptor },

    Busy { busy: bool },

    /// Claim acknowledged (the flag is set regardless of prior state)
    Claimed,

    /// TryClaim outcome: `won` is false when the flag was already set
    ClaimOutcome { won: bool },

    /// One status line from an in-flight build
    Progress { text: String },

    /// Build stream terminator: the delegate builder completed.
    /// Results and outputs are retrieved by separate calls.
    BuildFinished,

    /// Build stream terminator: the delegate builder failed
    BuildFailed { message: String },

    Results { properties: HashMap<String, String> },

    Outputs { files: Vec<OutputFile> },

    Cleared,

    /// Request refused or failed agent-side
    Error { message: String },
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
