// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bf ping`: discover a directory and check it answers.

use std::net::SocketAddr;
use std::time::Instant;

use anyhow::Result;

pub async fn handle(directory: Option<SocketAddr>) -> Result<()> {
    let directory = super::resolve_directory(directory).await?;
    let started = Instant::now();
    directory.ping().await?;
    println!("directory {} answered in {}ms", directory, started.elapsed().as_millis());
    Ok(())
}
