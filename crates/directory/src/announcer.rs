// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic beacon announcements.
//!
//! Fire-and-forget datagrams to the multicast group; discovery clients
//! treat repeated beacons as liveness. Send failures are logged and the
//! loop keeps going; a dropped beacon only delays discovery by one
//! interval.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use bf_wire::Beacon;

/// Announce `advertised` on `group` every `interval` until cancelled.
pub fn spawn(
    advertised: SocketAddr,
    group: SocketAddr,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(announce_loop(Beacon::new(advertised), group, interval, cancel))
}

async fn announce_loop(
    beacon: Beacon,
    group: SocketAddr,
    interval: Duration,
    cancel: CancellationToken,
) {
    let socket = match UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!(error = %e, "cannot bind announce socket, not announcing");
            return;
        }
    };
    let payload = match beacon.encode() {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "cannot encode beacon, not announcing");
            return;
        }
    };
    loop {
        if let Err(e) = socket.send_to(&payload, group).await {
            debug!(group = %group, "beacon send failed: {}", e);
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
#[path = "announcer_tests.rs"]
mod tests;
