// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type carrying a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit`
//! directly, so `main` owns process termination. The farm CLI reserves
//! code 1 for a build that ran and failed, and code 2 for "nothing to
//! build on": no directory discovered, or no idle agent matched.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    /// A build was dispatched and came back failed.
    pub fn build_failed(message: impl Into<String>) -> Self {
        Self { code: 1, message: message.into() }
    }

    /// The distributed path is unavailable: no directory or no agent.
    pub fn nothing_to_build_on(message: impl Into<String>) -> Self {
        Self { code: 2, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
