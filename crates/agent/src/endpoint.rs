// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent-side claim/build/output state machine.
//!
//! Every transition runs under one lock, so remote calls are totally
//! ordered even though a master's is-busy read and its claim are two
//! separate calls. The busy flag is the only mutual-exclusion
//! mechanism between masters, and clearing outputs is the only
//! transition that unsets it.

use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

use bf_core::AgentDescriptor;

/// An operation the state machine refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("agent is not claimed")]
    NotClaimed,

    #[error("a build is in progress")]
    BuildInProgress,

    #[error("no build results held")]
    NoResults,
}

/// One agent's observable state.
pub struct Endpoint {
    descriptor: AgentDescriptor,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    busy: bool,
    building: bool,
    report: Option<HashMap<String, String>>,
}

impl Endpoint {
    pub fn new(descriptor: AgentDescriptor) -> Self {
        Self { descriptor, state: Mutex::new(State::default()) }
    }

    pub fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    /// Point-in-time read; not a reservation.
    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    /// Unconditional, idempotent set of the busy flag. Reports nothing
    /// about the prior state.
    pub fn claim(&self) {
        let mut state = self.state.lock();
        if !state.busy {
            info!(agent = %self.descriptor.id, "claimed");
        }
        state.busy = true;
    }

    /// Compare-and-set claim: true when this caller flipped the flag.
    pub fn try_claim(&self) -> bool {
        let mut state = self.state.lock();
        if state.busy {
            return false;
        }
        state.busy = true;
        info!(agent = %self.descriptor.id, "claimed");
        true
    }

    /// Enter the building phase. The agent must have been claimed, and
    /// runs one build at a time.
    pub fn begin_build(&self) -> Result<(), StateError> {
        let mut state = self.state.lock();
        if !state.busy {
            return Err(StateError::NotClaimed);
        }
        if state.building {
            return Err(StateError::BuildInProgress);
        }
        state.building = true;
        state.report = None;
        Ok(())
    }

    /// Leave the building phase, holding the report until cleared.
    /// The busy flag stays set: finishing a build does not release.
    pub fn finish_build(&self, report: HashMap<String, String>) {
        let mut state = self.state.lock();
        state.building = false;
        state.report = Some(report);
    }

    /// Report properties of the last finished build.
    pub fn results(&self) -> Result<HashMap<String, String>, StateError> {
        self.state.lock().report.clone().ok_or(StateError::NoResults)
    }

    /// Whether a finished build's outputs are being held.
    pub fn has_output(&self) -> bool {
        self.state.lock().report.is_some()
    }

    /// Release: drop the held report and unset the busy flag. Refused
    /// while a build is running. Idempotent once idle.
    pub fn clear(&self) -> Result<(), StateError> {
        let mut state = self.state.lock();
        if state.building {
            return Err(StateError::BuildInProgress);
        }
        if state.busy {
            info!(agent = %self.descriptor.id, "released");
        }
        state.busy = false;
        state.report = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
