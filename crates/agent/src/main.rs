// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bfagent: the build agent daemon.
//!
//! Binds the endpoint, discovers a directory, keeps itself registered,
//! and runs builds dispatched by masters through the configured build
//! tool. Takes the config file path as its only argument.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bf_agent::{registrar, AgentConfig, AgentServer, CommandBuilder, Endpoint, OutputStore};
use bf_core::AgentDescriptor;
use bf_directory::DiscoveryClient;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("BF_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("usage: bfagent <config.toml>");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(&config_path).await {
        eprintln!("bfagent: {}", e);
        std::process::exit(1);
    }
}

async fn run(config_path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = AgentConfig::load(config_path)?;

    let listener = tokio::net::TcpListener::bind(config.agent.listen).await?;
    let local = listener.local_addr()?;
    let advertised = config.agent.advertise.unwrap_or(local);
    let descriptor = AgentDescriptor::new(advertised, config.agent.entries.clone());
    info!(agent = %descriptor.id, addr = %advertised, entries = %descriptor.entries, "agent endpoint ready");

    let builder = Arc::new(
        CommandBuilder::new(&config.builder.command, config.builder.args.clone())
            .with_env(config.builder.env.clone()),
    );
    let outputs = OutputStore::new(&config.agent.output_dir);
    let cancel = CancellationToken::new();

    let endpoint = Arc::new(Endpoint::new(descriptor.clone()));
    let server = AgentServer::new(listener, endpoint, builder, outputs, cancel.clone());
    tokio::spawn(server.run());

    let discovery = Arc::new(DiscoveryClient::spawn(config.discovery_config()));
    let registration =
        registrar::spawn(descriptor, config.lease_ttl(), discovery, cancel.clone());

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    cancel.cancel();
    // let the registrar withdraw its registration before exiting
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), registration).await;
    Ok(())
}
