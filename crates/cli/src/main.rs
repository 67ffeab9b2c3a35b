// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bf: the build farm operator CLI.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_error;

use exit_error::ExitError;

#[derive(Parser)]
#[command(name = "bf", version, about = "Distributed build farm client")]
struct Cli {
    /// Directory address; skips discovery
    #[arg(long, global = true, value_name = "ADDR")]
    directory: Option<std::net::SocketAddr>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a build on a remote agent
    Build(commands::build::BuildArgs),
    /// List registered agents and their status
    Agents(commands::agents::AgentsArgs),
    /// Discover a directory and check it answers
    Ping,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("BF_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Build(args) => commands::build::handle(args, cli.directory).await,
        Command::Agents(args) => commands::agents::handle(args, cli.directory).await,
        Command::Ping => commands::ping::handle(cli.directory).await,
    };

    if let Err(e) = result {
        match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                eprintln!("{}", exit);
                std::process::exit(exit.code);
            }
            None => {
                eprintln!("error: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}
