// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Master-side proxy to one agent endpoint.
//!
//! Unary calls open a connection, exchange one frame pair, and hang
//! up. `run_build` keeps its connection for the whole build and feeds
//! progress frames into a channel as they arrive. There is no read
//! timeout during a build: it is a long-lived blocking remote call,
//! bounded only by the agent finishing or the connection dying.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::debug;

use bf_core::{AgentDescriptor, AgentId, AgentStatus, BuildRequest, OutputFile};
use bf_wire::{decode, read_frame, read_message, write_frame, AgentRequest, AgentResponse, ProtocolError};

use crate::env;

/// Errors from remote agent calls.
#[derive(Debug, Error)]
pub enum AgentCallError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("agent error: {0}")]
    Remote(String),

    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("unexpected response to {call}")]
    Unexpected { call: &'static str },
}

/// Handle to one remote agent endpoint. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RemoteAgent {
    descriptor: AgentDescriptor,
    timeout: Duration,
}

impl RemoteAgent {
    pub fn new(descriptor: AgentDescriptor) -> Self {
        Self { descriptor, timeout: env::rpc_timeout() }
    }

    pub fn with_timeout(descriptor: AgentDescriptor, timeout: Duration) -> Self {
        Self { descriptor, timeout }
    }

    pub fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    pub fn id(&self) -> &AgentId {
        &self.descriptor.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.descriptor.addr
    }

    pub async fn ping(&self) -> Result<(), AgentCallError> {
        match self.call(&AgentRequest::Ping).await? {
            AgentResponse::Pong => Ok(()),
            other => Err(unexpected("ping", other)),
        }
    }

    /// Point-in-time busy read. Observing `false` reserves nothing.
    pub async fn is_busy(&self) -> Result<bool, AgentCallError> {
        match self.call(&AgentRequest::IsBusy).await? {
            AgentResponse::Busy { busy } => Ok(busy),
            other => Err(unexpected("is_busy", other)),
        }
    }

    pub async fn status(&self) -> Result<AgentStatus, AgentCallError> {
        Ok(AgentStatus::from_busy(self.is_busy().await?))
    }

    /// Unconditional claim: sets the flag and reports nothing about
    /// who held it. Prefer `try_claim` when racing other masters.
    pub async fn claim(&self) -> Result<(), AgentCallError> {
        match self.call(&AgentRequest::Claim).await? {
            AgentResponse::Claimed => Ok(()),
            other => Err(unexpected("claim", other)),
        }
    }

    /// Compare-and-set claim: true when this master won the flag.
    pub async fn try_claim(&self) -> Result<bool, AgentCallError> {
        match self.call(&AgentRequest::TryClaim).await? {
            AgentResponse::ClaimOutcome { won } => Ok(won),
            other => Err(unexpected("try_claim", other)),
        }
    }

    /// Dispatch a build and stream its progress lines into `progress`
    /// until the agent reports completion. Resolves with `Ok` on
    /// `BuildFinished`; a `BuildFailed` terminator becomes
    /// `AgentCallError::BuildFailed`.
    pub async fn run_build(
        &self,
        request: &BuildRequest,
        progress: mpsc::Sender<String>,
    ) -> Result<(), AgentCallError> {
        let mut stream = self.connect().await?;
        let (mut reader, mut writer) = stream.split();
        let dispatch = AgentRequest::Build { request: request.clone() };
        write_frame(&mut writer, &dispatch, self.timeout).await?;

        loop {
            let bytes = read_message(&mut reader).await?;
            match decode::<AgentResponse>(&bytes)? {
                AgentResponse::Progress { text } => {
                    if progress.send(text).await.is_err() {
                        // receiver gone; keep draining so the stream
                        // still reaches its terminator
                        debug!(agent = %self.id(), "progress receiver dropped");
                    }
                }
                AgentResponse::BuildFinished => return Ok(()),
                AgentResponse::BuildFailed { message } => {
                    return Err(AgentCallError::BuildFailed(message))
                }
                AgentResponse::Error { message } => return Err(AgentCallError::Remote(message)),
                other => return Err(unexpected("build", other)),
            }
        }
    }

    /// Report properties of the agent's last finished build.
    pub async fn results(&self) -> Result<HashMap<String, String>, AgentCallError> {
        match self.call(&AgentRequest::Results).await? {
            AgentResponse::Results { properties } => Ok(properties),
            other => Err(unexpected("results", other)),
        }
    }

    /// The output files the agent holds for its last finished build.
    pub async fn fetch_outputs(&self) -> Result<Vec<OutputFile>, AgentCallError> {
        match self.call(&AgentRequest::FetchOutputs).await? {
            AgentResponse::Outputs { files } => Ok(files),
            other => Err(unexpected("fetch_outputs", other)),
        }
    }

    /// Delete the agent's outputs and release it to the idle pool. The
    /// only call that releases a claim.
    ///
    /// Also the closest thing to a cancel: a caller abandoning a
    /// dispatched build can attempt this, but it does not stop
    /// in-flight remote work; the agent refuses it until its build
    /// finishes.
    pub async fn clear_outputs(&self) -> Result<(), AgentCallError> {
        match self.call(&AgentRequest::ClearOutputs).await? {
            AgentResponse::Cleared => Ok(()),
            other => Err(unexpected("clear_outputs", other)),
        }
    }

    async fn connect(&self) -> Result<TcpStream, AgentCallError> {
        match tokio::time::timeout(self.timeout, TcpStream::connect(self.descriptor.addr)).await {
            Ok(result) => Ok(result.map_err(ProtocolError::Io)?),
            Err(_) => Err(ProtocolError::Timeout.into()),
        }
    }

    async fn call(&self, request: &AgentRequest) -> Result<AgentResponse, AgentCallError> {
        let mut stream = self.connect().await?;
        let (mut reader, mut writer) = stream.split();
        write_frame(&mut writer, request, self.timeout).await?;
        Ok(read_frame(&mut reader, self.timeout).await?)
    }
}

fn unexpected(call: &'static str, response: AgentResponse) -> AgentCallError {
    match response {
        AgentResponse::Error { message } => AgentCallError::Remote(message),
        _ => AgentCallError::Unexpected { call },
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
