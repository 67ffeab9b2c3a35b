// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory discovery: multicast listening plus unicast probing.
//!
//! A discovery client hears beacons on the multicast group and probes a
//! fixed set of unicast addresses on a short interval. Either path can
//! surface a directory; probing also covers networks where multicast is
//! filtered. Transient probe failures are swallowed and retried; the
//! caller's `discover` timeout is the only deadline.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use bf_wire::{Beacon, MAX_BEACON_LEN};

use crate::client::DirectoryClient;
use crate::env;

/// Default multicast group directories announce on.
pub const DEFAULT_MULTICAST_ADDR: &str = "239.77.41.12:7745";

/// Deterministic fallback: probed even with no configuration at all, so
/// a single-host setup works out of the box.
pub const DEFAULT_DIRECTORY_ADDR: &str = "127.0.0.1:7746";

/// Discovery behavior knobs.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Multicast group to listen on; `None` disables listening.
    pub multicast: Option<SocketAddr>,
    /// Unicast addresses probed on a fixed interval.
    pub probes: Vec<SocketAddr>,
    pub probe_interval: Duration,
    /// A beacon-discovered directory unheard for this long is dropped.
    pub beacon_ttl: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            multicast: DEFAULT_MULTICAST_ADDR.parse().ok(),
            probes: DEFAULT_DIRECTORY_ADDR.parse().ok().into_iter().collect(),
            probe_interval: env::probe_interval(),
            beacon_ttl: env::beacon_ttl(),
        }
    }
}

/// Edge-triggered notifications about directories appearing and
/// disappearing.
pub trait DiscoveryListener: Send + Sync {
    fn discovered(&self, directory: &DirectoryClient);
    fn discarded(&self, directory: &DirectoryClient);
}

/// Locates service directories on the network.
pub struct DiscoveryClient {
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Shared {
    known: Mutex<IndexMap<SocketAddr, Sighting>>,
    notify: Notify,
    listeners: Mutex<Vec<Arc<dyn DiscoveryListener>>>,
}

#[derive(Debug, Clone, Copy)]
struct Sighting {
    last_seen: Instant,
    via_probe: bool,
}

impl DiscoveryClient {
    /// Start listening and probing in background tasks.
    pub fn spawn(config: DiscoveryConfig) -> Self {
        let shared = Arc::new(Shared::default());
        let cancel = CancellationToken::new();
        if let Some(group) = config.multicast {
            tokio::spawn(listen_for_beacons(group, Arc::clone(&shared), cancel.clone()));
        }
        tokio::spawn(probe_loop(config, Arc::clone(&shared), cancel.clone()));
        Self { shared, cancel }
    }

    /// Block up to `timeout` for any directory to be known, waking
    /// early on the first discovery. `None` on timeout is an ordinary
    /// outcome; callers commonly skip the distributed path for the
    /// attempt.
    pub async fn discover(&self, timeout: Duration) -> Option<DirectoryClient> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(directory) = self.first_known() {
                return Some(directory);
            }
            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep_until(deadline) => return self.first_known(),
            }
        }
    }

    /// Every directory currently known, discovery order.
    pub fn known(&self) -> Vec<DirectoryClient> {
        self.shared.known.lock().keys().map(|addr| DirectoryClient::new(*addr)).collect()
    }

    /// Register for discovered/discarded events. Already-known
    /// directories are replayed to the new listener.
    pub fn add_listener(&self, listener: Arc<dyn DiscoveryListener>) {
        for directory in self.known() {
            listener.discovered(&directory);
        }
        self.shared.listeners.lock().push(listener);
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn first_known(&self) -> Option<DirectoryClient> {
        self.shared.known.lock().keys().next().map(|addr| DirectoryClient::new(*addr))
    }
}

impl Drop for DiscoveryClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn mark_seen(shared: &Shared, addr: SocketAddr, via_probe: bool) {
    let newly = {
        let mut known = shared.known.lock();
        match known.get_mut(&addr) {
            Some(sighting) => {
                sighting.last_seen = Instant::now();
                sighting.via_probe |= via_probe;
                false
            }
            None => {
                known.insert(addr, Sighting { last_seen: Instant::now(), via_probe });
                true
            }
        }
    };
    if newly {
        info!(directory = %addr, "directory discovered");
        shared.notify.notify_waiters();
        let listeners = shared.listeners.lock().clone();
        let directory = DirectoryClient::new(addr);
        for listener in listeners {
            listener.discovered(&directory);
        }
    }
}

fn discard(shared: &Shared, addr: SocketAddr) {
    let removed = shared.known.lock().shift_remove(&addr).is_some();
    if removed {
        info!(directory = %addr, "directory lost");
        let listeners = shared.listeners.lock().clone();
        let directory = DirectoryClient::new(addr);
        for listener in listeners {
            listener.discarded(&directory);
        }
    }
}

async fn listen_for_beacons(group: SocketAddr, shared: Arc<Shared>, cancel: CancellationToken) {
    let socket = match bind_beacon_socket(group).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!(group = %group, error = %e, "multicast listen unavailable, relying on probes");
            return;
        }
    };
    let mut buf = [0u8; MAX_BEACON_LEN];
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            result = socket.recv_from(&mut buf) => match result {
                Ok((len, from)) => match Beacon::decode(&buf[..len]) {
                    Ok(beacon) => mark_seen(&shared, beacon.addr, false),
                    Err(e) => debug!(from = %from, "ignoring malformed beacon: {}", e),
                },
                Err(e) => {
                    warn!("beacon receive error: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

async fn bind_beacon_socket(group: SocketAddr) -> std::io::Result<UdpSocket> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, group.port())).await?;
    if let IpAddr::V4(ip) = group.ip() {
        if ip.is_multicast() {
            socket.join_multicast_v4(ip, Ipv4Addr::UNSPECIFIED)?;
        }
    }
    Ok(socket)
}

async fn probe_loop(config: DiscoveryConfig, shared: Arc<Shared>, cancel: CancellationToken) {
    loop {
        for addr in &config.probes {
            let probe = DirectoryClient::with_timeout(*addr, config.probe_interval);
            match probe.ping().await {
                Ok(()) => mark_seen(&shared, *addr, true),
                Err(e) => {
                    // Connection refused, reset, EOF: all expected while
                    // the directory is down. Retry next interval.
                    debug!(directory = %addr, "probe failed: {}", e);
                    discard(&shared, *addr);
                }
            }
        }
        sweep_stale_beacons(&shared, config.beacon_ttl);
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.probe_interval) => {}
        }
    }
}

fn sweep_stale_beacons(shared: &Shared, beacon_ttl: Duration) {
    let stale: Vec<SocketAddr> = {
        let known = shared.known.lock();
        known
            .iter()
            .filter(|(_, sighting)| !sighting.via_probe && sighting.last_seen.elapsed() > beacon_ttl)
            .map(|(addr, _)| *addr)
            .collect()
    };
    for addr in stale {
        debug!(directory = %addr, "beacon gone quiet");
        discard(shared, addr);
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
