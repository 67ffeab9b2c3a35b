// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the broker crate.

use std::time::Duration;

fn duration_ms(var: &str, default_ms: u64) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(default_ms))
}

/// Per-call remote timeout for agent RPCs
pub fn rpc_timeout() -> Duration {
    duration_ms("BF_RPC_TIMEOUT_MS", 5_000)
}

/// Poll interval between selection rounds under the blocking policy
pub fn retry_interval() -> Duration {
    duration_ms("BF_RETRY_INTERVAL_MS", 500)
}

/// How long callers wait for discovery before giving up on the
/// distributed path
pub fn discover_timeout() -> Duration {
    duration_ms("BF_DISCOVER_TIMEOUT_MS", 30_000)
}
