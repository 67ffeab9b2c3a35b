//! Shared spec harness: an in-process farm on loopback sockets.

pub use std::net::SocketAddr;
pub use std::sync::Arc;
pub use std::time::{Duration, Instant};

pub use tokio::net::TcpListener;
pub use tokio_util::sync::CancellationToken;

pub use bf_agent::{AgentServer, Builder, Endpoint, OutputStore, ScriptedBuilder};
pub use bf_broker::{AgentBroker, BrokerError, BrokerSettings, RemoteAgent, SelectionPolicy};
pub use bf_core::{
    AgentDescriptor, BuildOutcome, BuildRequest, Entries, ProgressSink, StatusLine, SystemClock,
    Transcript,
};
pub use bf_directory::{
    DirectoryClient, DirectoryServer, DiscoveryClient, DiscoveryConfig, Registry,
};

pub const REGISTRATION_TTL: Duration = Duration::from_secs(60);

/// One directory plus however many agents a spec spins up.
pub struct Farm {
    pub directory: DirectoryClient,
    pub directory_addr: SocketAddr,
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
        Self {
            directory: DirectoryClient::new(addr),
            directory_addr: addr,
            cancel,
            output_dirs: Vec::new(),
        }
    }

    /// Start an agent with the given builder and register it.
    pub async fn add_agent(
        &mut self,
        entries: Entries,
        builder: impl Builder + 'static,
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

        self.directory.register(&descriptor, REGISTRATION_TTL).await.unwrap();
        descriptor
    }

    /// A broker bound to this farm's directory.
    pub fn broker(&self, filter: Entries, policy: SelectionPolicy) -> AgentBroker {
        AgentBroker::new(self.directory.clone(), BrokerSettings::new(filter).with_policy(policy))
            .unwrap()
    }
}

impl Drop for Farm {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub fn test_entries() -> Entries {
    Entries::new().with("build.type", "test")
}

pub fn test_filter() -> Entries {
    Entries::new().with("build.type", "test")
}
