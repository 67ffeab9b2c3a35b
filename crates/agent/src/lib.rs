// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bf-agent: the remote build worker.
//!
//! An agent runs one build at a time. Masters observe its busy flag,
//! claim it, dispatch a build, retrieve the outputs, and release it by
//! clearing them. The endpoint state machine serializes those calls;
//! the delegate builder does the actual work; the registrar keeps the
//! agent published in a service directory.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod builder;
pub mod config;
pub mod endpoint;
pub mod env;
pub mod outputs;
pub mod registrar;
pub mod server;

pub use builder::{BuildError, Builder, CommandBuilder};
pub use config::{AgentConfig, ConfigError};
pub use endpoint::{Endpoint, StateError};
pub use outputs::OutputStore;
pub use server::AgentServer;

#[cfg(any(test, feature = "test-support"))]
pub use builder::ScriptedBuilder;
