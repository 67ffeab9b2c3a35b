// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delegate builders: what actually runs a build on the agent.
//!
//! The endpoint dispatches to whatever `Builder` it was configured
//! with. Production agents use `CommandBuilder`, which invokes an
//! external build tool and turns its output lines into progress
//! updates. Build properties are forwarded unmodified: they are
//! written to a `build.properties` file the tool is pointed at.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use bf_core::BuildRequest;

/// Name of the properties file handed to the build tool.
const PROPERTIES_FILE: &str = "build.properties";

/// Errors from a delegate build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("build tool failed to start: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("build tool exited with {0}")]
    ToolFailed(std::process::ExitStatus),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Failed(String),
}

/// Runs one build on behalf of the endpoint.
///
/// Implementations stream human-readable status lines through
/// `progress`, may drop artifact files into `out_dir`, and return
/// properties merged into the build's report.
#[async_trait]
pub trait Builder: Send + Sync {
    async fn run(
        &self,
        request: &BuildRequest,
        out_dir: &Path,
        progress: &mpsc::Sender<String>,
    ) -> Result<HashMap<String, String>, BuildError>;
}

/// Invokes the externally configured build tool.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl CommandBuilder {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self { command: command.into(), args, env: HashMap::new() }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

#[async_trait]
impl Builder for CommandBuilder {
    async fn run(
        &self,
        request: &BuildRequest,
        out_dir: &Path,
        progress: &mpsc::Sender<String>,
    ) -> Result<HashMap<String, String>, BuildError> {
        // Properties pass through unmodified, as a file the tool reads.
        let properties_path = out_dir.join(PROPERTIES_FILE);
        let mut pairs: Vec<(&String, &String)> = request.properties.iter().collect();
        pairs.sort();
        let mut contents = String::new();
        for (key, value) in pairs {
            contents.push_str(key);
            contents.push('=');
            contents.push_str(value);
            contents.push('\n');
        }
        tokio::fs::write(&properties_path, contents).await?;

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .envs(&self.env)
            .env("BF_PROJECT", &request.project)
            .env("BF_BUILD_PROPERTIES", &properties_path)
            .current_dir(out_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(BuildError::Spawn)?;

        let mut pumps = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            pumps.push(pump_lines(stdout, progress.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(pump_lines(stderr, progress.clone()));
        }

        let status = child.wait().await?;
        for pump in pumps {
            let _ = pump.await;
        }

        if !status.success() {
            return Err(BuildError::ToolFailed(status));
        }

        let mut properties = HashMap::new();
        properties.insert("builder.command".to_string(), self.command.clone());
        if let Some(code) = status.code() {
            properties.insert("exit.code".to_string(), code.to_string());
        }
        Ok(properties)
    }
}

/// Forward each line of a pipe as a progress update. Keeps draining
/// after the receiver goes away so the child never blocks on a full
/// pipe.
fn pump_lines<R>(pipe: R, progress: mpsc::Sender<String>) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        let mut receiver_gone = false;
        while let Ok(Some(line)) = lines.next_line().await {
            if !receiver_gone && progress.send(line).await.is_err() {
                receiver_gone = true;
            }
        }
    })
}

/// Replays a scripted build: emits fixed progress lines, optionally
/// writes an artifact, then succeeds or fails.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct ScriptedBuilder {
    lines: Vec<String>,
    properties: HashMap<String, String>,
    artifact: Option<(String, Vec<u8>)>,
    failure: Option<String>,
    delay: std::time::Duration,
}

#[cfg(any(test, feature = "test-support"))]
impl ScriptedBuilder {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { lines: lines.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_artifact(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.artifact = Some((path.into(), contents.into()));
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl Builder for ScriptedBuilder {
    async fn run(
        &self,
        _request: &BuildRequest,
        out_dir: &Path,
        progress: &mpsc::Sender<String>,
    ) -> Result<HashMap<String, String>, BuildError> {
        for line in &self.lines {
            let _ = progress.send(line.clone()).await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some((path, contents)) = &self.artifact {
            let path = out_dir.join(path);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, contents).await?;
        }
        match &self.failure {
            Some(message) => Err(BuildError::Failed(message.clone())),
            None => Ok(self.properties.clone()),
        }
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
