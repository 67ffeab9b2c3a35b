// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent endpoint RPC server.
//!
//! Accepts connections and handles each in a spawned task. Unary calls
//! answer with one frame; `Build` turns the connection into a stream of
//! progress frames ending in a terminator. State transitions all pass
//! through the endpoint's single lock, which is what keeps concurrent
//! claim calls totally ordered.
//!
//! A master that disconnects mid-build does not stop the build: the
//! agent finishes, holds the outputs, and stays busy until cleared or
//! until its directory lease lapses.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use bf_core::BuildRequest;
use bf_wire::{read_frame, write_frame, AgentRequest, AgentResponse, ProtocolError};

use crate::builder::{BuildError, Builder};
use crate::endpoint::Endpoint;
use crate::env;
use crate::outputs::OutputStore;

/// Shared context for all request handlers.
pub(crate) struct ServeCtx {
    pub endpoint: Arc<Endpoint>,
    pub builder: Arc<dyn Builder>,
    pub outputs: OutputStore,
}

/// TCP listener answering the agent protocol.
pub struct AgentServer {
    listener: TcpListener,
    ctx: Arc<ServeCtx>,
    cancel: CancellationToken,
}

impl AgentServer {
    pub fn new(
        listener: TcpListener,
        endpoint: Arc<Endpoint>,
        builder: Arc<dyn Builder>,
        outputs: OutputStore,
        cancel: CancellationToken,
    ) -> Self {
        Self { listener, ctx: Arc::new(ServeCtx { endpoint, builder, outputs }), cancel }
    }

    pub async fn bind(
        addr: SocketAddr,
        endpoint: Arc<Endpoint>,
        builder: Arc<dyn Builder>,
        outputs: OutputStore,
        cancel: CancellationToken,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::new(listener, endpoint, builder, outputs, cancel))
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
                    info!("agent endpoint stopping");
                    return;
                }
                result = self.listener.accept() => match result {
                    Ok((stream, _)) => {
                        let ctx = Arc::clone(&self.ctx);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &ctx).await {
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

async fn handle_connection(stream: TcpStream, ctx: &Arc<ServeCtx>) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();
    let request: AgentRequest = read_frame(&mut reader, env::rpc_timeout()).await?;

    // Status reads are frequent polling; log them at debug only
    if matches!(request, AgentRequest::Ping | AgentRequest::IsBusy | AgentRequest::Describe) {
        debug!(request = ?request, "received query");
    } else {
        info!(request = ?request, "received request");
    }

    match request {
        // Build upgrades the connection into a progress stream
        AgentRequest::Build { request } => handle_build(request, &mut writer, ctx).await,
        unary => {
            let response = handle_request(unary, ctx);
            write_frame(&mut writer, &response, env::rpc_timeout()).await
        }
    }
}

fn handle_request(request: AgentRequest, ctx: &ServeCtx) -> AgentResponse {
    match request {
        AgentRequest::Ping => AgentResponse::Pong,

        AgentRequest::Describe => {
            AgentResponse::Descriptor { descriptor: ctx.endpoint.descriptor().clone() }
        }

        AgentRequest::IsBusy => AgentResponse::Busy { busy: ctx.endpoint.is_busy() },

        AgentRequest::Claim => {
            ctx.endpoint.claim();
            AgentResponse::Claimed
        }

        AgentRequest::TryClaim => AgentResponse::ClaimOutcome { won: ctx.endpoint.try_claim() },

        AgentRequest::Results => match ctx.endpoint.results() {
            Ok(properties) => AgentResponse::Results { properties },
            Err(e) => AgentResponse::Error { message: e.to_string() },
        },

        AgentRequest::FetchOutputs => {
            if !ctx.endpoint.has_output() {
                return AgentResponse::Error { message: "no build outputs held".to_string() };
            }
            match ctx.outputs.collect() {
                Ok(files) => AgentResponse::Outputs { files },
                Err(e) => AgentResponse::Error { message: format!("output collection failed: {}", e) },
            }
        }

        AgentRequest::ClearOutputs => match ctx.endpoint.clear() {
            Ok(()) => {
                if let Err(e) = ctx.outputs.clear() {
                    warn!("output deletion failed: {}", e);
                }
                AgentResponse::Cleared
            }
            Err(e) => AgentResponse::Error { message: e.to_string() },
        },

        // Intercepted in handle_connection before reaching handle_request
        AgentRequest::Build { .. } => unreachable!(),
    }
}

async fn handle_build(
    request: BuildRequest,
    writer: &mut OwnedWriteHalf,
    ctx: &Arc<ServeCtx>,
) -> Result<(), ProtocolError> {
    if let Err(e) = ctx.endpoint.begin_build() {
        let response = AgentResponse::Error { message: e.to_string() };
        return write_frame(writer, &response, env::rpc_timeout()).await;
    }

    if let Err(e) = ctx.outputs.prepare() {
        let message = format!("output directory unavailable: {}", e);
        ctx.endpoint.finish_build(failure_report(&request, ctx, &message));
        let response = AgentResponse::BuildFailed { message };
        return write_frame(writer, &response, env::rpc_timeout()).await;
    }

    info!(project = %request.project, "build starting");
    let started = Instant::now();

    let (tx, mut rx) = mpsc::channel::<String>(64);
    let builder = Arc::clone(&ctx.builder);
    let build_request = request.clone();
    let out_dir = ctx.outputs.root().to_path_buf();
    let build_task =
        tokio::spawn(async move { builder.run(&build_request, &out_dir, &tx).await });

    // Relay progress lines to the master while the build runs. If the
    // master goes away the build keeps going; its lines still land in
    // the log.
    let mut master_gone = false;
    while let Some(line) = rx.recv().await {
        if let Err(e) = ctx.outputs.append_log(&line) {
            warn!("build log write failed: {}", e);
        }
        if !master_gone {
            let frame = AgentResponse::Progress { text: line };
            if let Err(e) = write_frame(writer, &frame, env::rpc_timeout()).await {
                debug!("master went away mid-build: {}", e);
                master_gone = true;
            }
        }
    }

    let result = match build_task.await {
        Ok(result) => result,
        Err(e) => Err(BuildError::Failed(format!("builder task died: {}", e))),
    };

    let elapsed = started.elapsed();
    let mut properties = base_report(&request, ctx);
    properties.insert("duration.ms".to_string(), elapsed.as_millis().to_string());

    let terminator = match result {
        Ok(extra) => {
            properties.insert("successful".to_string(), "true".to_string());
            properties.extend(extra);
            info!(project = %request.project, elapsed_ms = elapsed.as_millis() as u64, "build finished");
            AgentResponse::BuildFinished
        }
        Err(e) => {
            let message = e.to_string();
            properties.insert("successful".to_string(), "false".to_string());
            properties.insert("error".to_string(), message.clone());
            warn!(project = %request.project, error = %message, "build failed");
            AgentResponse::BuildFailed { message }
        }
    };
    ctx.endpoint.finish_build(properties);

    if master_gone {
        Ok(())
    } else {
        write_frame(writer, &terminator, env::rpc_timeout()).await
    }
}

fn base_report(request: &BuildRequest, ctx: &ServeCtx) -> HashMap<String, String> {
    HashMap::from([
        ("project".to_string(), request.project.clone()),
        ("agent".to_string(), ctx.endpoint.descriptor().id.to_string()),
    ])
}

fn failure_report(request: &BuildRequest, ctx: &ServeCtx, message: &str) -> HashMap<String, String> {
    let mut properties = base_report(request, ctx);
    properties.insert("successful".to_string(), "false".to_string());
    properties.insert("error".to_string(), message.to_string());
    properties
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
