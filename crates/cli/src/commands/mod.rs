// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

use std::net::SocketAddr;

use anyhow::Result;

use bf_broker::env;
use bf_directory::{DirectoryClient, DiscoveryClient, DiscoveryConfig};

use crate::exit_error::ExitError;

pub mod agents;
pub mod build;
pub mod ping;

/// Use the explicitly given directory, or discover one.
pub(crate) async fn resolve_directory(explicit: Option<SocketAddr>) -> Result<DirectoryClient> {
    if let Some(addr) = explicit {
        return Ok(DirectoryClient::new(addr));
    }
    let discovery = DiscoveryClient::spawn(DiscoveryConfig::default());
    match discovery.discover(env::discover_timeout()).await {
        Some(directory) => Ok(directory),
        None => {
            Err(ExitError::nothing_to_build_on("no service directory found on the network").into())
        }
    }
}
