// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completions delivered to the client's event loop

use crate::transport::TransportEvent;
use obc_adapters::{AgentError, ObexError, ObexLink, ProgressUpdate};
use obc_core::{OpId, SessionId};
use tokio::sync::mpsc;

/// A completed asynchronous call, tagged with its owner and op id.
#[derive(Debug)]
pub enum Event {
    /// A connector step finished
    Transport {
        transport: String,
        event: TransportEvent,
    },
    /// A session-owned call finished
    Session {
        session: SessionId,
        op: OpId,
        outcome: SessionOutcome,
    },
}

#[derive(Debug)]
pub enum SessionOutcome {
    Handshake(Result<ObexLink, ObexError>),
    AgentReply(Result<String, AgentError>),
    OwnerVanished,
}

/// Anything the loop can wake up for.
#[derive(Debug)]
pub enum Incoming {
    Event(Event),
    Progress(ProgressUpdate),
}

/// Cloneable handle spawned calls use to report back.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::debug!("event loop gone, dropping completion");
        }
    }
}
