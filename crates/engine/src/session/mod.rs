// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sessions: identity, lifecycle state and the owned transfer queue

mod registry;
mod transfer;

pub use registry::SessionRegistry;
pub use transfer::{Transfer, TransferOutcome, TransferReport, TransferState, TransferStatus};

use crate::driver::Driver;
use crate::pending::PendingCalls;
use obc_adapters::{AgentBinding, ObexLink};
use obc_core::{AttemptId, BdAddr, BusName, ObcError, ObjectPath, RefCount, ServiceName, SessionId};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Identity tuple used for session reuse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub source: Option<BdAddr>,
    pub destination: BdAddr,
    pub service: ServiceName,
    /// Zero means "discover via SDP"
    pub channel: u8,
    pub owner: Option<BusName>,
}

impl SessionKey {
    /// Whether this session satisfies a lookup.
    ///
    /// Destination, service and owner must be equal. Source only counts when
    /// the query names one and channel only when the query's is non-zero.
    pub fn matches(&self, query: &SessionKey) -> bool {
        self.destination == query.destination
            && self.service == query.service
            && query.source.map_or(true, |s| self.source == Some(s))
            && (query.channel == 0 || self.channel == query.channel)
            && self.owner == query.owner
    }
}

/// Lifecycle of a live session. Destruction removes the session from the
/// registry, so a destroyed session is observed as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unbound,
    Connecting,
    Connected,
    ShuttingDown,
}

/// Properties exposed on the IPC surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub destination: String,
    pub channel: u8,
}

pub(crate) type Waiter = oneshot::Sender<Result<(), ObcError>>;

pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) key: SessionKey,
    pub(crate) transport: String,
    pub(crate) attempt: Option<AttemptId>,
    pub(crate) driver: Arc<dyn Driver>,
    pub(crate) state: SessionState,
    pub(crate) refs: RefCount,
    pub(crate) link: Option<ObexLink>,
    pub(crate) agent: Option<AgentBinding>,
    pub(crate) watched: Option<BusName>,
    pub(crate) queue: VecDeque<Transfer>,
    pub(crate) calls: PendingCalls,
    pub(crate) path: Option<ObjectPath>,
    pub(crate) notifier: Option<mpsc::UnboundedSender<TransferReport>>,
    pub(crate) waiters: Vec<Waiter>,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        key: SessionKey,
        transport: String,
        driver: Arc<dyn Driver>,
    ) -> Self {
        Self {
            id,
            key,
            transport,
            attempt: None,
            driver,
            state: SessionState::Unbound,
            refs: RefCount::new(),
            link: None,
            agent: None,
            watched: None,
            queue: VecDeque::new(),
            calls: PendingCalls::new(),
            path: None,
            notifier: None,
            waiters: Vec::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn refs(&self) -> u32 {
        self.refs.get()
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn transfers(&self) -> impl Iterator<Item = &Transfer> {
        self.queue.iter()
    }

    pub fn head(&self) -> Option<&Transfer> {
        self.queue.front()
    }

    pub fn properties(&self) -> SessionProperties {
        SessionProperties {
            source: self.key.source.map(|s| s.to_string()),
            destination: self.key.destination.to_string(),
            channel: self.key.channel,
        }
    }

    /// Resolve every waiting connect caller with the same result.
    pub(crate) fn resolve_waiters(&mut self, result: Result<(), ObcError>) {
        for waiter in self.waiters.drain(..) {
            // Caller dropped its receiver
            let _ = waiter.send(result.clone());
        }
    }

    pub(crate) fn report(&mut self, report: TransferReport) {
        if let Some(notifier) = &self.notifier {
            if notifier.send(report).is_err() {
                tracing::debug!(session = self.id.get(), "completion receiver gone");
            }
        }
    }
}

#[cfg(test)]
#[path = "../session_tests.rs"]
mod tests;
