// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use serial_test::serial;

use super::*;

#[test]
#[serial]
fn rpc_timeout_defaults_and_overrides() {
    std::env::remove_var("BF_RPC_TIMEOUT_MS");
    assert_eq!(rpc_timeout(), Duration::from_secs(5));

    std::env::set_var("BF_RPC_TIMEOUT_MS", "1500");
    assert_eq!(rpc_timeout(), Duration::from_millis(1500));

    // unparseable values fall back to the default
    std::env::set_var("BF_RPC_TIMEOUT_MS", "soon");
    assert_eq!(rpc_timeout(), Duration::from_secs(5));

    std::env::remove_var("BF_RPC_TIMEOUT_MS");
}

#[test]
#[serial]
fn multicast_addr_can_be_disabled() {
    std::env::remove_var("BF_MULTICAST_ADDR");
    assert_eq!(multicast_addr(), DEFAULT_MULTICAST_ADDR.parse().ok());

    std::env::set_var("BF_MULTICAST_ADDR", "off");
    assert_eq!(multicast_addr(), None);

    std::env::set_var("BF_MULTICAST_ADDR", "239.1.2.3:9000");
    assert_eq!(multicast_addr(), "239.1.2.3:9000".parse().ok());

    std::env::remove_var("BF_MULTICAST_ADDR");
}
