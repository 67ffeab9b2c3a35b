// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leased agent registrations.
//!
//! The directory owns the set of currently-registered descriptors. A
//! registration lives for its TTL and must be renewed; agents that die
//! or partition stop renewing and get evicted. Eviction is the only
//! backstop for an agent stranded busy by an unreachable master.

use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use bf_core::{AgentDescriptor, AgentId, Clock, Entries};

/// In-memory registration table with lease expiry.
pub struct Registry<C: Clock> {
    clock: C,
    agents: Mutex<IndexMap<AgentId, Registration>>,
}

#[derive(Debug, Clone)]
struct Registration {
    descriptor: AgentDescriptor,
    expires_at: Instant,
}

impl<C: Clock> Registry<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, agents: Mutex::new(IndexMap::new()) }
    }

    /// Publish a descriptor with a fresh lease.
    ///
    /// Re-registering an id replaces the previous registration
    /// wholesale: changed entries are a new descriptor, not an edit.
    pub fn register(&self, descriptor: AgentDescriptor, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        let id = descriptor.id.clone();
        let addr = descriptor.addr;
        let replaced = self
            .agents
            .lock()
            .insert(id.clone(), Registration { descriptor, expires_at })
            .is_some();
        if replaced {
            info!(agent = %id, addr = %addr, "registration replaced");
        } else {
            info!(agent = %id, addr = %addr, "agent registered");
        }
    }

    /// Extend a live lease. Returns false when the id is unknown or its
    /// lease has already lapsed; the caller should register again.
    pub fn renew(&self, id: &AgentId, ttl: Duration) -> bool {
        let now = self.clock.now();
        let mut agents = self.agents.lock();
        match agents.get_mut(id) {
            Some(registration) if registration.expires_at > now => {
                registration.expires_at = now + ttl;
                debug!(agent = %id, "lease renewed");
                true
            }
            Some(_) => {
                agents.shift_remove(id);
                debug!(agent = %id, "renew after lapse, registration dropped");
                false
            }
            None => false,
        }
    }

    /// Withdraw a registration ahead of its lease expiry.
    pub fn deregister(&self, id: &AgentId) -> bool {
        let removed = self.agents.lock().shift_remove(id).is_some();
        if removed {
            info!(agent = %id, "agent deregistered");
        }
        removed
    }

    /// Live registrations matching the filter, in registration order.
    ///
    /// The order is an implementation detail; callers must not rely on
    /// it for fairness.
    pub fn lookup(&self, filter: &Entries) -> Vec<AgentDescriptor> {
        let now = self.clock.now();
        self.agents
            .lock()
            .values()
            .filter(|r| r.expires_at > now)
            .filter(|r| filter.matches(&r.descriptor.entries))
            .map(|r| r.descriptor.clone())
            .collect()
    }

    /// Evict registrations whose lease has lapsed. Returns how many.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut agents = self.agents.lock();
        let before = agents.len();
        agents.retain(|id, registration| {
            let live = registration.expires_at > now;
            if !live {
                warn!(agent = %id, "lease expired, evicting registration");
            }
            live
        });
        before - agents.len()
    }

    pub fn len(&self) -> usize {
        self.agents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.lock().is_empty()
    }
}

/// Periodically sweep expired leases until cancelled.
pub fn spawn_sweeper<C>(
    registry: Arc<Registry<C>>,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()>
where
    C: Clock + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(interval) => {
                    registry.sweep();
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
