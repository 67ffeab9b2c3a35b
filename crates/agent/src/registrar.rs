// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keeps the agent published in a service directory.
//!
//! Register, then renew at a third of the lease TTL. A lost lease
//! (directory restarted, or the renewals were too late) triggers
//! re-registration; a lost directory triggers rediscovery. Errors are
//! never fatal here; an agent that cannot reach a directory just
//! keeps trying, invisible to masters until it succeeds.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use bf_core::AgentDescriptor;
use bf_directory::{DirectoryClient, DiscoveryClient};

use crate::env;

/// Start the registration loop in a background task.
pub fn spawn(
    descriptor: AgentDescriptor,
    ttl: Duration,
    discovery: Arc<DiscoveryClient>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(register_loop(descriptor, ttl, discovery, cancel))
}

async fn register_loop(
    descriptor: AgentDescriptor,
    ttl: Duration,
    discovery: Arc<DiscoveryClient>,
    cancel: CancellationToken,
) {
    let renew_interval = ttl / 3;
    loop {
        let directory = tokio::select! {
            _ = cancel.cancelled() => return,
            found = discovery.discover(env::discover_timeout()) => match found {
                Some(directory) => directory,
                None => {
                    warn!("no directory discovered, retrying");
                    continue;
                }
            }
        };

        if let Err(e) = directory.register(&descriptor, ttl).await {
            warn!(directory = %directory, "registration failed: {}", e);
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(renew_interval) => continue,
            }
        }
        info!(directory = %directory, agent = %descriptor.id, "registered");

        if !renew_until_lost(&descriptor, ttl, renew_interval, &directory, &cancel).await {
            // cancelled: withdraw the registration on the way out
            if let Err(e) = directory.deregister(&descriptor.id).await {
                debug!(directory = %directory, "deregistration failed: {}", e);
            }
            return;
        }
    }
}

/// Renew until the lease or directory is lost (true) or the task is
/// cancelled (false).
async fn renew_until_lost(
    descriptor: &AgentDescriptor,
    ttl: Duration,
    renew_interval: Duration,
    directory: &DirectoryClient,
    cancel: &CancellationToken,
) -> bool {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(renew_interval) => {}
        }
        match directory.renew(&descriptor.id, ttl).await {
            Ok(true) => debug!(agent = %descriptor.id, "lease renewed"),
            Ok(false) => {
                info!(directory = %directory, "lease lost, re-registering");
                return true;
            }
            Err(e) => {
                warn!(directory = %directory, "renew failed: {}", e);
                return true;
            }
        }
    }
}

#[cfg(test)]
#[path = "registrar_tests.rs"]
mod tests;
