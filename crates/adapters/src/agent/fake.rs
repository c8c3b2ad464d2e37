// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake agent for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AgentAdapter, AgentBinding, AgentError};
use crate::hold::HeldCalls;
use async_trait::async_trait;
use obc_core::ObjectPath;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded agent call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentCall {
    Request {
        agent: AgentBinding,
        transfer: ObjectPath,
    },
    Progress {
        transfer: ObjectPath,
        transferred: u64,
    },
    Complete {
        transfer: ObjectPath,
    },
    Error {
        transfer: ObjectPath,
        message: String,
    },
    Release {
        agent: AgentBinding,
    },
}

struct FakeAgentState {
    reply: Result<String, AgentError>,
    hold_requests: bool,
    calls: Vec<AgentCall>,
}

/// Fake agent. Authorizes every request with an empty reply until configured.
#[derive(Clone)]
pub struct FakeAgentAdapter {
    inner: Arc<Mutex<FakeAgentState>>,
    held: HeldCalls,
}

impl Default for FakeAgentAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeAgentState {
                reply: Ok(String::new()),
                hold_requests: false,
                calls: Vec::new(),
            })),
            held: HeldCalls::default(),
        }
    }
}

impl FakeAgentAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<AgentCall> {
        self.inner.lock().calls.clone()
    }

    pub fn requests(&self) -> Vec<ObjectPath> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                AgentCall::Request { transfer, .. } => Some(transfer.clone()),
                _ => None,
            })
            .collect()
    }

    /// Reply every request with this name
    pub fn set_reply(&self, name: &str) {
        self.inner.lock().reply = Ok(name.to_string());
    }

    /// Refuse every request with this error
    pub fn set_error(&self, error: AgentError) {
        self.inner.lock().reply = Err(error);
    }

    pub fn hold_requests(&self, hold: bool) {
        self.inner.lock().hold_requests = hold;
    }

    /// Number of calls currently suspended
    pub fn held_calls(&self) -> usize {
        self.held.count()
    }
}

#[async_trait]
impl AgentAdapter for FakeAgentAdapter {
    async fn request(
        &self,
        agent: &AgentBinding,
        transfer: &ObjectPath,
    ) -> Result<String, AgentError> {
        let (hold, reply) = {
            let mut inner = self.inner.lock();
            inner.calls.push(AgentCall::Request {
                agent: agent.clone(),
                transfer: transfer.clone(),
            });
            (inner.hold_requests, inner.reply.clone())
        };
        if hold {
            return self.held.park().await;
        }
        reply
    }

    fn notify_progress(&self, _agent: &AgentBinding, transfer: &ObjectPath, transferred: u64) {
        self.inner.lock().calls.push(AgentCall::Progress {
            transfer: transfer.clone(),
            transferred,
        });
    }

    fn notify_complete(&self, _agent: &AgentBinding, transfer: &ObjectPath) {
        self.inner.lock().calls.push(AgentCall::Complete {
            transfer: transfer.clone(),
        });
    }

    fn notify_error(&self, _agent: &AgentBinding, transfer: &ObjectPath, message: &str) {
        self.inner.lock().calls.push(AgentCall::Error {
            transfer: transfer.clone(),
            message: message.to_string(),
        });
    }

    fn release(&self, agent: &AgentBinding) {
        self.inner.lock().calls.push(AgentCall::Release {
            agent: agent.clone(),
        });
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
