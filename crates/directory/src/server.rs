// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lookup service listener.
//!
//! Accepts connections and handles each in a spawned task: one request
//! frame in, one response frame out. Registration mutations and lookups
//! both go through the shared registry.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use bf_core::Clock;
use bf_wire::{read_frame, write_frame, DirectoryRequest, DirectoryResponse, ProtocolError};

use crate::env;
use crate::registry::Registry;

/// TCP listener answering the directory protocol.
pub struct DirectoryServer<C: Clock> {
    listener: TcpListener,
    registry: Arc<Registry<C>>,
    cancel: CancellationToken,
}

impl<C: Clock + 'static> DirectoryServer<C> {
    pub async fn bind(
        addr: SocketAddr,
        registry: Arc<Registry<C>>,
        cancel: CancellationToken,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, registry, cancel })
    }

    /// The bound address; useful when binding to port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until cancelled.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("lookup service stopping");
                    return;
                }
                result = self.listener.accept() => match result {
                    Ok((stream, _)) => {
                        let registry = Arc::clone(&self.registry);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &registry, env::rpc_timeout()).await {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => error!("accept error: {}", e),
                }
            }
        }
    }
}

async fn handle_connection<C: Clock>(
    mut stream: TcpStream,
    registry: &Registry<C>,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.split();
    let request: DirectoryRequest = read_frame(&mut reader, timeout).await?;

    // Lookups and pings are frequent polling; log them at debug only
    if matches!(request, DirectoryRequest::Lookup { .. } | DirectoryRequest::Ping) {
        debug!(request = ?request, "received query");
    } else {
        info!(request = ?request, "received request");
    }

    let response = handle_request(request, registry);
    write_frame(&mut writer, &response, timeout).await
}

fn handle_request<C: Clock>(request: DirectoryRequest, registry: &Registry<C>) -> DirectoryResponse {
    match request {
        DirectoryRequest::Ping => DirectoryResponse::Pong,

        DirectoryRequest::Register { descriptor, ttl_ms } => {
            registry.register(descriptor, Duration::from_millis(ttl_ms));
            DirectoryResponse::Registered
        }

        DirectoryRequest::Renew { id, ttl_ms } => {
            if registry.renew(&id, Duration::from_millis(ttl_ms)) {
                DirectoryResponse::Renewed
            } else {
                DirectoryResponse::UnknownRegistration
            }
        }

        DirectoryRequest::Deregister { id } => {
            registry.deregister(&id);
            DirectoryResponse::Deregistered
        }

        DirectoryRequest::Lookup { filter } => {
            DirectoryResponse::Matches { agents: registry.lookup(&filter) }
        }
    }
}

fn log_connection_error(e: ProtocolError) {
    match e {
        ProtocolError::ConnectionClosed => debug!("client disconnected"),
        ProtocolError::Timeout => debug!("connection timed out"),
        _ => error!("connection error: {}", e),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
