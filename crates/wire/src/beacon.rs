// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery beacon datagrams.
//!
//! A directory announces itself by multicasting a small JSON datagram
//! carrying the address its lookup service listens on. Beacons are
//! fire-and-forget; liveness comes from hearing them repeatedly.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::frame::ProtocolError;

/// Upper bound for a beacon datagram; anything longer is dropped.
pub const MAX_BEACON_LEN: usize = 512;

/// A directory's periodic announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beacon {
    /// Address of the directory's lookup service.
    pub addr: SocketAddr,
}

impl Beacon {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
#[path = "beacon_tests.rs"]
mod tests;
