// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server tests over real loopback connections.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bf_core::{AgentDescriptor, Entries, SystemClock};
use tokio_util::sync::CancellationToken;

use super::*;
use crate::client::DirectoryClient;

const TTL: Duration = Duration::from_secs(30);

async fn start_server() -> (Arc<Registry<SystemClock>>, SocketAddr, CancellationToken) {
    let registry = Arc::new(Registry::new(SystemClock));
    let cancel = CancellationToken::new();
    let server = DirectoryServer::bind(
        "127.0.0.1:0".parse().unwrap(),
        Arc::clone(&registry),
        cancel.clone(),
    )
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    (registry, addr, cancel)
}

#[tokio::test]
async fn register_then_lookup_round_trip() {
    let (_registry, addr, _cancel) = start_server().await;
    let client = DirectoryClient::new(addr);

    let descriptor = AgentDescriptor::new(
        "127.0.0.1:4100".parse().unwrap(),
        Entries::new().with("build.type", "test"),
    );
    client.register(&descriptor, TTL).await.unwrap();

    let hits = client.lookup(&Entries::new().with("build.type", "test")).await.unwrap();
    assert_eq!(hits, vec![descriptor]);

    let misses = client.lookup(&Entries::new().with("build.type", "prod")).await.unwrap();
    assert!(misses.is_empty());
}

#[tokio::test]
async fn ping_answers_pong() {
    let (_registry, addr, _cancel) = start_server().await;
    DirectoryClient::new(addr).ping().await.unwrap();
}

#[tokio::test]
async fn renew_round_trip_distinguishes_unknown() {
    let (_registry, addr, _cancel) = start_server().await;
    let client = DirectoryClient::new(addr);

    let descriptor = AgentDescriptor::new("127.0.0.1:4100".parse().unwrap(), Entries::new());
    client.register(&descriptor, TTL).await.unwrap();

    assert!(client.renew(&descriptor.id, TTL).await.unwrap());
    assert!(!client.renew(&"agt-ghost".into(), TTL).await.unwrap());
}

#[tokio::test]
async fn deregister_removes_from_lookup() {
    let (_registry, addr, _cancel) = start_server().await;
    let client = DirectoryClient::new(addr);

    let descriptor = AgentDescriptor::new("127.0.0.1:4100".parse().unwrap(), Entries::new());
    client.register(&descriptor, TTL).await.unwrap();
    client.deregister(&descriptor.id).await.unwrap();

    assert!(client.lookup(&Entries::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_server_stops_accepting() {
    let (_registry, addr, cancel) = start_server().await;
    cancel.cancel();
    // give the accept loop a moment to observe cancellation
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = DirectoryClient::with_timeout(addr, Duration::from_millis(200));
    assert!(client.ping().await.is_err());
}

#[tokio::test]
async fn connect_to_nothing_is_an_error_not_a_hang() {
    // bind and drop to get an address with no listener
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = DirectoryClient::with_timeout(addr, Duration::from_millis(200));
    assert!(client.ping().await.is_err());
}
