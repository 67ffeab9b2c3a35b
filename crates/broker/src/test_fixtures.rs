// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures: an in-process directory and scripted agents on
//! loopback sockets.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use bf_agent::{AgentServer, Endpoint, OutputStore, ScriptedBuilder};
use bf_core::{AgentDescriptor, Entries, SystemClock};
use bf_directory::{DirectoryClient, DirectoryServer, Registry};

pub(crate) const REGISTRATION_TTL: Duration = Duration::from_secs(60);

/// One directory plus however many agents a test spins up.
pub(crate) struct Farm {
    pub directory: DirectoryClient,
    cancel: CancellationToken,
    output_dirs: Vec<tempfile::TempDir>,
}

impl Farm {
    pub async fn start() -> Self {
        let registry = Arc::new(Registry::new(SystemClock));
        let cancel = CancellationToken::new();
        let server = DirectoryServer::bind("127.0.0.1:0".parse().unwrap(), registry, cancel.clone())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());
        Self { directory: DirectoryClient::new(addr), cancel, output_dirs: Vec::new() }
    }

    /// Start a scripted agent and register it with the directory.
    pub async fn add_agent(&mut self, entries: Entries, builder: ScriptedBuilder) -> AgentDescriptor {
        let descriptor = self.add_unregistered_agent(entries, builder).await;
        self.directory.register(&descriptor, REGISTRATION_TTL).await.unwrap();
        descriptor
    }

    /// Start a scripted agent without telling the directory about it.
    pub async fn add_unregistered_agent(
        &mut self,
        entries: Entries,
        builder: ScriptedBuilder,
    ) -> AgentDescriptor {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let descriptor = AgentDescriptor::new(addr, entries);

        let dir = tempfile::tempdir().unwrap();
        let outputs = OutputStore::new(dir.path().join("outputs"));
        let endpoint = Arc::new(Endpoint::new(descriptor.clone()));
        let server =
            AgentServer::new(listener, endpoint, Arc::new(builder), outputs, self.cancel.clone());
        tokio::spawn(server.run());
        self.output_dirs.push(dir);
        descriptor
    }

    /// Register a descriptor whose address has nothing listening.
    pub async fn add_phantom_agent(&self, entries: Entries) -> AgentDescriptor {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let descriptor = AgentDescriptor::new(addr, entries);
        self.directory.register(&descriptor, REGISTRATION_TTL).await.unwrap();
        descriptor
    }
}

impl Drop for Farm {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub(crate) fn test_entries() -> Entries {
    Entries::new().with("build.type", "test")
}

pub(crate) fn test_filter() -> Entries {
    Entries::new().with("build.type", "test")
}
