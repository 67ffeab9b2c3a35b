// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client view of a service directory.
//!
//! One remote call per operation, no retry logic: retries, if any,
//! belong to the caller. Each call opens its own connection.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;

use bf_core::{AgentDescriptor, AgentId, Entries};
use bf_wire::{read_frame, write_frame, DirectoryRequest, DirectoryResponse, ProtocolError};

use crate::env;

/// Handle to one discovered directory. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryClient {
    addr: SocketAddr,
    timeout: Duration,
}

/// Errors from directory calls.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("directory error: {0}")]
    Remote(String),

    #[error("unexpected response to {call}")]
    Unexpected { call: &'static str },
}

impl DirectoryClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, timeout: env::rpc_timeout() }
    }

    pub fn with_timeout(addr: SocketAddr, timeout: Duration) -> Self {
        Self { addr, timeout }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Health check, also used by discovery probes.
    pub async fn ping(&self) -> Result<(), DirectoryError> {
        match self.call(&DirectoryRequest::Ping).await? {
            DirectoryResponse::Pong => Ok(()),
            other => Err(unexpected("ping", other)),
        }
    }

    /// Publish a descriptor with a fresh lease.
    pub async fn register(
        &self,
        descriptor: &AgentDescriptor,
        ttl: Duration,
    ) -> Result<(), DirectoryError> {
        let request = DirectoryRequest::Register {
            descriptor: descriptor.clone(),
            ttl_ms: ttl_millis(ttl),
        };
        match self.call(&request).await? {
            DirectoryResponse::Registered => Ok(()),
            other => Err(unexpected("register", other)),
        }
    }

    /// Extend a lease. `Ok(false)` means the directory no longer knows
    /// the registration and the agent should register again.
    pub async fn renew(&self, id: &AgentId, ttl: Duration) -> Result<bool, DirectoryError> {
        let request = DirectoryRequest::Renew { id: id.clone(), ttl_ms: ttl_millis(ttl) };
        match self.call(&request).await? {
            DirectoryResponse::Renewed => Ok(true),
            DirectoryResponse::UnknownRegistration => Ok(false),
            other => Err(unexpected("renew", other)),
        }
    }

    /// Withdraw a registration ahead of its lease expiry.
    pub async fn deregister(&self, id: &AgentId) -> Result<(), DirectoryError> {
        match self.call(&DirectoryRequest::Deregister { id: id.clone() }).await? {
            DirectoryResponse::Deregistered => Ok(()),
            other => Err(unexpected("deregister", other)),
        }
    }

    /// All live registrations matching the filter. Empty is a normal
    /// result, not an error.
    pub async fn lookup(&self, filter: &Entries) -> Result<Vec<AgentDescriptor>, DirectoryError> {
        let request = DirectoryRequest::Lookup { filter: filter.clone() };
        match self.call(&request).await? {
            DirectoryResponse::Matches { agents } => Ok(agents),
            other => Err(unexpected("lookup", other)),
        }
    }

    async fn call(&self, request: &DirectoryRequest) -> Result<DirectoryResponse, DirectoryError> {
        let mut stream = match tokio::time::timeout(self.timeout, TcpStream::connect(self.addr)).await
        {
            Ok(result) => result.map_err(ProtocolError::Io)?,
            Err(_) => return Err(ProtocolError::Timeout.into()),
        };
        let (mut reader, mut writer) = stream.split();
        write_frame(&mut writer, request, self.timeout).await?;
        Ok(read_frame(&mut reader, self.timeout).await?)
    }
}

impl fmt::Display for DirectoryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

fn unexpected(call: &'static str, response: DirectoryResponse) -> DirectoryError {
    match response {
        DirectoryResponse::Error { message } => DirectoryError::Remote(message),
        _ => DirectoryError::Unexpected { call },
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
