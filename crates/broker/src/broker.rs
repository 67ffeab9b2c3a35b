// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent selection and build orchestration.
//!
//! `pick_agent` walks lookup candidates in directory-return order and
//! claims the first one not observed busy. "Nothing idle" is a `None`,
//! never an error; only malformed filters and unrecoverable directory
//! failures are errors. `build` runs the full round trip: pick,
//! dispatch, relay progress, retrieve, and always release once.
//!
//! The claim uses the endpoint's compare-and-set, so a race lost to
//! another master moves on to the next candidate instead of stacking a
//! second build onto a taken agent.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use bf_core::{AgentDescriptor, AgentId, BuildOutcome, BuildReport, BuildRequest, Entries, ProgressSink};
use bf_directory::{DirectoryClient, DirectoryError};

use crate::env;
use crate::remote::{AgentCallError, RemoteAgent};

/// What to do when no agent is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Return immediately with no agent.
    FailFast,
    /// Poll the directory until the deadline, then give up.
    Block { timeout: Duration },
}

/// Broker configuration, validated at construction.
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    /// Entries an agent must match to be a candidate. Must be
    /// non-empty: an empty filter would dispatch to any agent on the
    /// network, foreign ones included.
    pub filter: Entries,
    pub policy: SelectionPolicy,
    /// Pause between selection rounds under the blocking policy.
    pub retry_interval: Duration,
}

impl BrokerSettings {
    pub fn new(filter: Entries) -> Self {
        Self { filter, policy: SelectionPolicy::FailFast, retry_interval: env::retry_interval() }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Errors from selection and dispatch.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("selection filter has no entries")]
    EmptyFilter,

    #[error("directory lookup failed: {0}")]
    Directory(#[from] DirectoryError),

    #[error("remote call to agent {agent} failed: {source}")]
    Agent {
        agent: AgentId,
        #[source]
        source: AgentCallError,
    },

    #[error("build on agent {agent} failed: {message}")]
    BuildFailed { agent: AgentId, message: String },
}

/// The master-side orchestrator.
///
/// Holds an explicit directory handle: callers decide which directory
/// a broker works against, discovery hands them out.
pub struct AgentBroker {
    directory: DirectoryClient,
    settings: BrokerSettings,
}

impl AgentBroker {
    pub fn new(directory: DirectoryClient, settings: BrokerSettings) -> Result<Self, BrokerError> {
        if settings.filter.is_empty() {
            return Err(BrokerError::EmptyFilter);
        }
        Ok(Self { directory, settings })
    }

    pub fn directory(&self) -> &DirectoryClient {
        &self.directory
    }

    /// Select and claim one idle agent matching `filter`.
    ///
    /// `Ok(None)` means no agent was available within the policy
    /// window, an ordinary outcome callers branch on. Candidates that
    /// cannot be reached are skipped, not fatal.
    pub async fn pick_agent(
        &self,
        filter: &Entries,
        policy: SelectionPolicy,
    ) -> Result<Option<RemoteAgent>, BrokerError> {
        if filter.is_empty() {
            return Err(BrokerError::EmptyFilter);
        }
        let deadline = match policy {
            SelectionPolicy::FailFast => None,
            SelectionPolicy::Block { timeout } => Some(tokio::time::Instant::now() + timeout),
        };

        loop {
            match self.directory.lookup(filter).await {
                Ok(candidates) => {
                    if let Some(agent) = claim_first_idle(candidates).await {
                        return Ok(Some(agent));
                    }
                }
                Err(e) => match deadline {
                    // transient lookup errors are retried until the
                    // deadline under the blocking policy
                    Some(d) if tokio::time::Instant::now() < d => {
                        warn!("directory lookup failed, retrying: {}", e);
                    }
                    _ => return Err(e.into()),
                },
            }

            match deadline {
                None => return Ok(None),
                Some(d) => {
                    let now = tokio::time::Instant::now();
                    if now >= d {
                        return Ok(None);
                    }
                    tokio::time::sleep(self.settings.retry_interval.min(d - now)).await;
                }
            }
        }
    }

    /// Run one distributed build: pick an agent with the configured
    /// filter and policy, dispatch, relay progress to `sink`, retrieve
    /// the report and outputs, and release the agent.
    ///
    /// The release runs exactly once, success or failure. If it fails
    /// the agent is abandoned to the directory's lease expiry; that is
    /// logged, not retried, and does not mask the primary outcome.
    pub async fn build(
        &self,
        request: BuildRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<BuildOutcome, BrokerError> {
        let picked = self.pick_agent(&self.settings.filter, self.settings.policy).await?;
        let Some(agent) = picked else {
            info!(project = %request.project, "no agent available");
            return Ok(BuildOutcome::NoAgent);
        };
        info!(project = %request.project, agent = %agent.id(), "dispatching build");

        // Progress flows agent -> channel -> relay task -> caller's
        // sink, preserving emission order.
        let (tx, mut rx) = mpsc::channel::<String>(64);
        let relay_sink = Arc::clone(&sink);
        let relay = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                relay_sink.update(&line);
            }
        });

        let dispatched = agent.run_build(&request, tx).await;
        let _ = relay.await;

        let result = match dispatched {
            Ok(()) => {
                sink.update(&format!("retrieving results from {}", agent.id()));
                self.retrieve(&agent).await
            }
            Err(AgentCallError::BuildFailed(message)) => {
                Err(BrokerError::BuildFailed { agent: agent.id().clone(), message })
            }
            Err(source) => Err(agent_error(&agent, source)),
        };

        if let Err(e) = agent.clear_outputs().await {
            warn!(agent = %agent.id(), "release failed, abandoning agent to lease expiry: {}", e);
        }

        result
    }

    async fn retrieve(&self, agent: &RemoteAgent) -> Result<BuildOutcome, BrokerError> {
        let properties = agent.results().await.map_err(|e| agent_error(agent, e))?;
        let outputs = agent.fetch_outputs().await.map_err(|e| agent_error(agent, e))?;
        Ok(BuildOutcome::Completed(BuildReport {
            agent: agent.id().clone(),
            properties,
            outputs,
        }))
    }
}

/// Walk candidates in directory-return order; claim the first one not
/// observed busy. Unreachable candidates and lost claim races are
/// skipped.
async fn claim_first_idle(candidates: Vec<AgentDescriptor>) -> Option<RemoteAgent> {
    for descriptor in candidates {
        let agent = RemoteAgent::new(descriptor);
        match agent.is_busy().await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => {
                debug!(agent = %agent.id(), "candidate unreachable: {}", e);
                continue;
            }
        }
        match agent.try_claim().await {
            Ok(true) => return Some(agent),
            Ok(false) => {
                debug!(agent = %agent.id(), "lost the claim race");
                continue;
            }
            Err(e) => {
                debug!(agent = %agent.id(), "claim failed: {}", e);
                continue;
            }
        }
    }
    None
}

fn agent_error(agent: &RemoteAgent, source: AgentCallError) -> BrokerError {
    BrokerError::Agent { agent: agent.id().clone(), source }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
