// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bfdir: the service directory daemon.
//!
//! Listens for registrations and lookups, sweeps expired leases, and
//! announces itself on the multicast group. Configuration is via
//! `BF_*` environment variables (see `env.rs`).

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bf_core::SystemClock;
use bf_directory::registry::spawn_sweeper;
use bf_directory::{announcer, env, DirectoryServer, Registry};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("BF_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("bfdir: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> std::io::Result<()> {
    let registry = Arc::new(Registry::new(SystemClock));
    let cancel = CancellationToken::new();

    let server =
        DirectoryServer::bind(env::listen_addr(), Arc::clone(&registry), cancel.clone()).await?;
    let local = server.local_addr()?;
    info!(addr = %local, "lookup service listening");

    if let Some(group) = env::multicast_addr() {
        let advertised = env::advertise_addr().unwrap_or(local);
        announcer::spawn(advertised, group, env::announce_interval(), cancel.clone());
        info!(group = %group, advertised = %advertised, "announcing");
    }

    spawn_sweeper(registry, env::sweep_interval(), cancel.clone());
    let serving = tokio::spawn(server.run());

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    cancel.cancel();
    let _ = serving.await;
    Ok(())
}
