// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outstanding asynchronous calls owned by an attempt or a session.
//!
//! Each call runs as a spawned task that reports back through the event
//! channel, tagged with the [`OpId`] handed out here. A completion is only
//! acted on if [`PendingCalls::complete`] still finds its id, so a call
//! fires at most once and never after its owner cancelled it.

use obc_core::{OpId, Sequence, TransferId};
use std::collections::HashMap;
use tokio::task::JoinHandle;

/// What an outstanding call is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    AdapterResolve,
    SessionReserve,
    DiscoveryConnect,
    DiscoverySearch,
    StreamConnect,
    Handshake,
    AgentRequest(TransferId),
    OwnerWatch,
}

struct PendingCall {
    kind: CallKind,
    task: JoinHandle<()>,
}

/// Registry of outstanding calls, indexed by operation id.
///
/// Dropping the registry aborts every call still in it.
#[derive(Default)]
pub struct PendingCalls {
    ids: Sequence,
    calls: HashMap<OpId, PendingCall>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an op id, spawn the call with it, and track the task.
    pub fn track<F>(&mut self, kind: CallKind, spawn: F) -> OpId
    where
        F: FnOnce(OpId) -> JoinHandle<()>,
    {
        let op: OpId = self.ids.next();
        let task = spawn(op);
        self.calls.insert(op, PendingCall { kind, task });
        op
    }

    /// Remove a finished call. `None` means the completion is stale.
    pub fn complete(&mut self, op: OpId) -> Option<CallKind> {
        self.calls.remove(&op).map(|call| call.kind)
    }

    /// Abort one call. Returns false if it was not outstanding.
    pub fn cancel(&mut self, op: OpId) -> bool {
        match self.calls.remove(&op) {
            Some(call) => {
                call.task.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every outstanding call, returning how many there were.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.calls.len();
        for (op, call) in self.calls.drain() {
            tracing::debug!(op = op.get(), kind = ?call.kind, "cancelling pending call");
            call.task.abort();
        }
        count
    }

    /// Abort outstanding calls of one kind.
    pub fn cancel_kind(&mut self, kind: CallKind) -> usize {
        let ops: Vec<OpId> = self
            .calls
            .iter()
            .filter(|(_, call)| call.kind == kind)
            .map(|(op, _)| *op)
            .collect();
        ops.into_iter().filter(|op| self.cancel(*op)).count()
    }

    pub fn contains(&self, op: OpId) -> bool {
        self.calls.contains_key(&op)
    }

    #[cfg(test)]
    pub(crate) fn has_kind(&self, kind: CallKind) -> bool {
        self.calls.values().any(|call| call.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl Drop for PendingCalls {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
