// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bf build`: run one distributed build and retrieve its outputs.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use bf_broker::{AgentBroker, BrokerError, BrokerSettings, SelectionPolicy};
use bf_core::{BuildOutcome, BuildRequest, Entries, OutputFile, ProgressSink};

use crate::exit_error::ExitError;

#[derive(Args)]
pub struct BuildArgs {
    /// Project name
    pub project: String,

    /// Build properties forwarded to the agent's build tool
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Entries an agent must match (e.g. build.type=test)
    #[arg(short = 'r', long = "require", value_name = "KEY=VALUE")]
    pub require: Vec<String>,

    /// Wait up to this many seconds for an idle agent instead of
    /// failing fast
    #[arg(long, value_name = "SECS")]
    pub wait: Option<u64>,

    /// Write retrieved output files into this directory
    #[arg(long, value_name = "DIR")]
    pub into: Option<PathBuf>,
}

/// Prints each progress line as it streams in.
struct PrintSink;

impl ProgressSink for PrintSink {
    fn update(&self, text: &str) {
        println!("  {}", text);
    }
}

pub async fn handle(args: BuildArgs, directory: Option<SocketAddr>) -> Result<()> {
    let filter = Entries::from_pairs(&args.require)?;
    let properties = Entries::from_pairs(&args.set)?;

    let directory = super::resolve_directory(directory).await?;
    let policy = match args.wait {
        Some(secs) => SelectionPolicy::Block { timeout: Duration::from_secs(secs) },
        None => SelectionPolicy::FailFast,
    };
    let broker = AgentBroker::new(directory, BrokerSettings::new(filter).with_policy(policy))?;

    let mut request = BuildRequest::new(&args.project);
    for (key, value) in properties.iter() {
        request.properties.insert(key.to_string(), value.to_string());
    }

    println!("building '{}'", args.project);
    match broker.build(request, Arc::new(PrintSink)).await {
        Ok(BuildOutcome::Completed(report)) => {
            println!("build of '{}' completed on {}", args.project, report.agent);
            let mut pairs: Vec<_> = report.properties.iter().collect();
            pairs.sort();
            for (key, value) in pairs {
                println!("  {} = {}", key, value);
            }
            if let Some(dir) = &args.into {
                write_outputs(dir, &report.outputs)?;
                println!("{} output file(s) written to {}", report.outputs.len(), dir.display());
            }
            Ok(())
        }
        Ok(BuildOutcome::NoAgent) => {
            Err(ExitError::nothing_to_build_on("no idle agent matched the filter").into())
        }
        Err(BrokerError::BuildFailed { agent, message }) => {
            Err(ExitError::build_failed(format!("build failed on {}: {}", agent, message)).into())
        }
        Err(e) => Err(e.into()),
    }
}

fn write_outputs(dir: &Path, outputs: &[OutputFile]) -> Result<()> {
    for file in outputs {
        let path = dir.join(&file.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &file.contents)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
