// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer entries held in a session's queue

use obc_adapters::{Direction, TransferKind};
use obc_core::{ObcError, ObjectPath, SessionId, TransferId};

/// Where a queued transfer is, as seen by its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Queued,
    /// Waiting on the agent's reply
    Authorizing,
    /// Bytes are moving; only ever the queue head
    Active,
}

#[derive(Debug, Clone)]
pub struct Transfer {
    pub id: TransferId,
    pub kind: TransferKind,
    /// Display name, replaced by a non-empty agent reply
    pub name: Option<String>,
    pub path: Option<ObjectPath>,
    pub size: u64,
    pub transferred: u64,
    pub state: TransferState,
    /// Direction the transfer is started in
    pub via: Direction,
}

impl Transfer {
    pub fn new(
        id: TransferId,
        kind: TransferKind,
        name: Option<String>,
        path: Option<ObjectPath>,
        size: u64,
    ) -> Self {
        Self {
            id,
            kind,
            name,
            path,
            size,
            transferred: 0,
            state: TransferState::Queued,
            via: kind.direction(),
        }
    }
}

/// How a head transfer left the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Complete,
    /// Failed while starting or running; the agent is told
    Failed(ObcError),
    /// The agent refused it; it never started
    Refused(ObcError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Progress { transferred: u64, size: u64 },
    Complete,
    Failed(ObcError),
}

/// Message delivered on a session's completion channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub session: SessionId,
    pub transfer: TransferId,
    pub status: TransferStatus,
}
