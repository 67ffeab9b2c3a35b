// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bf-directory: the service directory agents publish themselves to.
//!
//! The registry holds leased registrations, the server answers lookup
//! and registration calls, the announcer multicasts the directory's
//! address, and the discovery client finds directories from the other
//! side of that protocol.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod announcer;
pub mod client;
pub mod discovery;
pub mod env;
pub mod registry;
pub mod server;

pub use client::{DirectoryClient, DirectoryError};
pub use discovery::{
    DiscoveryClient, DiscoveryConfig, DiscoveryListener, DEFAULT_DIRECTORY_ADDR,
    DEFAULT_MULTICAST_ADDR,
};
pub use registry::{spawn_sweeper, Registry};
pub use server::DirectoryServer;
