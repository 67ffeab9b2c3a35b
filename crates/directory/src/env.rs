// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the directory crate.

use std::net::SocketAddr;
use std::time::Duration;

use crate::discovery::{DEFAULT_DIRECTORY_ADDR, DEFAULT_MULTICAST_ADDR};

fn duration_ms(var: &str, default_ms: u64) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(default_ms))
}

/// Per-call remote timeout for directory RPCs
pub fn rpc_timeout() -> Duration {
    duration_ms("BF_RPC_TIMEOUT_MS", 5_000)
}

/// Beacon emission interval
pub fn announce_interval() -> Duration {
    duration_ms("BF_ANNOUNCE_INTERVAL_MS", 2_000)
}

/// Lease sweep interval
pub fn sweep_interval() -> Duration {
    duration_ms("BF_SWEEP_INTERVAL_MS", 1_000)
}

/// Unicast probe interval for discovery
pub fn probe_interval() -> Duration {
    duration_ms("BF_PROBE_INTERVAL_MS", 250)
}

/// How long a beacon-discovered directory stays known without being
/// heard from again (three missed announcements by default).
pub fn beacon_ttl() -> Duration {
    duration_ms("BF_BEACON_TTL_MS", 6_000)
}

/// Lookup service listen address for `bfdir`
pub fn listen_addr() -> SocketAddr {
    std::env::var("BF_DIRECTORY_LISTEN")
        .ok()
        .and_then(|s| s.parse().ok())
        .or_else(|| DEFAULT_DIRECTORY_ADDR.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 7746)))
}

/// Address advertised in beacons when it differs from the listen
/// address (NAT, 0.0.0.0 binds).
pub fn advertise_addr() -> Option<SocketAddr> {
    std::env::var("BF_DIRECTORY_ADVERTISE").ok().and_then(|s| s.parse().ok())
}

/// Multicast group for announcements; `BF_MULTICAST_ADDR=off` disables
/// announcing entirely.
pub fn multicast_addr() -> Option<SocketAddr> {
    match std::env::var("BF_MULTICAST_ADDR") {
        Ok(s) if s.eq_ignore_ascii_case("off") => None,
        Ok(s) => s.parse().ok(),
        Err(_) => DEFAULT_MULTICAST_ADDR.parse().ok(),
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
