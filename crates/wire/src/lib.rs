// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for build-farm remote calls.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.
//! Discovery beacons are standalone JSON datagrams.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod agent;
mod beacon;
mod directory;
mod frame;

pub use agent::{AgentRequest, AgentResponse};
pub use beacon::{Beacon, MAX_BEACON_LEN};
pub use directory::{DirectoryRequest, DirectoryResponse};
pub use frame::{
    decode, encode, read_frame, read_message, write_frame, write_message, ProtocolError,
    MAX_FRAME_LEN,
};

#[cfg(test)]
mod property_tests;
