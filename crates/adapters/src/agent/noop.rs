// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op agent adapter.

use super::{AgentAdapter, AgentBinding, AgentError};
use async_trait::async_trait;
use obc_core::ObjectPath;

/// Agent adapter that authorizes every transfer unchanged and discards
/// notifications.
///
/// Used for headless clients with no user-facing agent.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpAgentAdapter;

impl NoOpAgentAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentAdapter for NoOpAgentAdapter {
    async fn request(
        &self,
        _agent: &AgentBinding,
        _transfer: &ObjectPath,
    ) -> Result<String, AgentError> {
        Ok(String::new())
    }

    fn notify_progress(&self, _agent: &AgentBinding, _transfer: &ObjectPath, _transferred: u64) {}

    fn notify_complete(&self, _agent: &AgentBinding, _transfer: &ObjectPath) {}

    fn notify_error(&self, _agent: &AgentBinding, _transfer: &ObjectPath, _message: &str) {}

    fn release(&self, _agent: &AgentBinding) {}
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
