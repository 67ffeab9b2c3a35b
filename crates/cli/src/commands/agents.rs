// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bf agents`: list registered agents with their live status.

use std::net::SocketAddr;

use anyhow::Result;
use clap::Args;

use bf_broker::RemoteAgent;
use bf_core::Entries;

#[derive(Args)]
pub struct AgentsArgs {
    /// Only list agents matching these entries; all agents when omitted
    #[arg(short = 'r', long = "require", value_name = "KEY=VALUE")]
    pub require: Vec<String>,
}

pub async fn handle(args: AgentsArgs, directory: Option<SocketAddr>) -> Result<()> {
    let filter = Entries::from_pairs(&args.require)?;
    let directory = super::resolve_directory(directory).await?;

    let agents = directory.lookup(&filter).await?;
    if agents.is_empty() {
        println!("no agents registered");
        return Ok(());
    }

    for descriptor in agents {
        let remote = RemoteAgent::new(descriptor.clone());
        // a point-in-time read; the agent may be claimed the moment
        // after this prints
        let status = match remote.status().await {
            Ok(status) => status.to_string(),
            Err(_) => "unreachable".to_string(),
        };
        println!("{}  {}  {}  {}", descriptor.id, descriptor.addr, status, descriptor.entries);
    }
    Ok(())
}
