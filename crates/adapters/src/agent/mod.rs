// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing authorization agent

mod noop;

pub use noop::NoOpAgentAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{AgentCall, FakeAgentAdapter};

use async_trait::async_trait;
use obc_core::{BusName, ObjectPath};
use thiserror::Error;

/// An agent registered by a principal at its callback path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentBinding {
    pub name: BusName,
    pub path: ObjectPath,
}

/// Errors from agent requests
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// The agent answered with an error reply
    #[error("{name}: {message}")]
    Replied { name: String, message: String },
    #[error("agent unreachable: {0}")]
    Unreachable(String),
}

impl AgentError {
    /// Message to surface as the transfer's failure
    pub fn message(&self) -> &str {
        match self {
            AgentError::Replied { message, .. } => message,
            AgentError::Unreachable(message) => message,
        }
    }
}

/// Adapter for talking to a session's agent.
#[async_trait]
pub trait AgentAdapter: Clone + Send + Sync + 'static {
    /// Ask the agent to authorize a transfer. A non-empty reply renames it.
    async fn request(&self, agent: &AgentBinding, transfer: &ObjectPath)
        -> Result<String, AgentError>;

    fn notify_progress(&self, agent: &AgentBinding, transfer: &ObjectPath, transferred: u64);

    fn notify_complete(&self, agent: &AgentBinding, transfer: &ObjectPath);

    fn notify_error(&self, agent: &AgentBinding, transfer: &ObjectPath, message: &str);

    /// Tell the agent it is no longer bound
    fn release(&self, agent: &AgentBinding);
}
