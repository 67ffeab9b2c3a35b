// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent daemon configuration.
//!
//! One TOML file describes the endpoint, the entries it advertises,
//! the build tool it delegates to, and how it finds a directory.
//!
//! ```toml
//! [agent]
//! listen = "0.0.0.0:4100"
//! output_dir = "/var/lib/bfagent/outputs"
//!
//! [agent.entries]
//! "build.type" = "test"
//! os = "linux"
//!
//! [builder]
//! command = "cargo"
//! args = ["build", "--release"]
//!
//! [directory]
//! probe = ["10.0.0.5:7746"]
//! lease_ttl_ms = 30000
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use bf_core::Entries;
use bf_directory::{DiscoveryConfig, DEFAULT_DIRECTORY_ADDR, DEFAULT_MULTICAST_ADDR};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("cannot parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub agent: AgentSection,
    pub builder: BuilderSection,
    #[serde(default)]
    pub directory: DirectorySection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSection {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Address other hosts reach this agent at, when it differs from
    /// `listen` (NAT, 0.0.0.0 binds).
    #[serde(default)]
    pub advertise: Option<SocketAddr>,
    pub output_dir: PathBuf,
    /// Capability entries this agent registers under. Masters select
    /// on these, so an empty table would make the agent unselectable.
    pub entries: Entries,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuilderSection {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectorySection {
    /// Unicast directory addresses to probe; the deterministic default
    /// is used when empty.
    #[serde(default)]
    pub probe: Vec<SocketAddr>,
    #[serde(default = "default_multicast")]
    pub multicast: bool,
    #[serde(default = "default_lease_ttl_ms")]
    pub lease_ttl_ms: u64,
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self { probe: Vec::new(), multicast: default_multicast(), lease_ttl_ms: default_lease_ttl_ms() }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 4100))
}

fn default_multicast() -> bool {
    true
}

fn default_lease_ttl_ms() -> u64 {
    30_000
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config: AgentConfig = toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.entries.is_empty() {
            return Err(ConfigError::Invalid(
                "agent.entries must not be empty: masters select agents by entry".to_string(),
            ));
        }
        if self.builder.command.trim().is_empty() {
            return Err(ConfigError::Invalid("builder.command must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn lease_ttl(&self) -> Duration {
        Duration::from_millis(self.directory.lease_ttl_ms)
    }

    /// Discovery settings derived from the `[directory]` section.
    pub fn discovery_config(&self) -> DiscoveryConfig {
        let defaults = DiscoveryConfig::default();
        DiscoveryConfig {
            multicast: if self.directory.multicast {
                DEFAULT_MULTICAST_ADDR.parse().ok()
            } else {
                None
            },
            probes: if self.directory.probe.is_empty() {
                DEFAULT_DIRECTORY_ADDR.parse().ok().into_iter().collect()
            } else {
                self.directory.probe.clone()
            },
            ..defaults
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
