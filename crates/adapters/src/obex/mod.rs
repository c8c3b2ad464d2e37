// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OBEX protocol collaborator: handshake and transfer execution

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeObexAdapter, ObexCall};

use crate::socket::BtStream;
use async_trait::async_trait;
use obc_core::{BusName, ObjectPath, SessionId, TransferId};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from the OBEX layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObexError {
    #[error("OBEX Connect failed with 0x{0:02x}")]
    Response(u8),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("transfer error: {0}")]
    Transfer(String),
}

/// An OBEX connection established over a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObexLink(u64);

impl ObexLink {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Get,
    Pull,
    Put,
    Send,
}

impl TransferKind {
    pub fn direction(&self) -> Direction {
        match self {
            TransferKind::Get | TransferKind::Pull => Direction::Get,
            TransferKind::Put | TransferKind::Send => Direction::Put,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Get => "get",
            TransferKind::Pull => "pull",
            TransferKind::Put => "put",
            TransferKind::Send => "send",
        }
    }
}

/// Which way bytes move once a transfer starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Get,
    Put,
}

/// Local side of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferPayload {
    /// Received into memory
    Memory,
    /// Sent from an in-memory buffer
    Buffer(Vec<u8>),
    /// Sent from or received into a local file
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub id: TransferId,
    pub kind: TransferKind,
    /// Logical object name
    pub name: Option<String>,
    /// Target object name on the peer
    pub target: Option<String>,
    pub mime_type: Option<String>,
    /// Opaque application parameters
    pub params: Option<Vec<u8>>,
    pub payload: TransferPayload,
    /// Bus name of the session's agent, if any
    pub agent: Option<BusName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRegistration {
    /// External-facing identity, if the transfer was exported
    pub path: Option<ObjectPath>,
    /// Total size when known up front, else zero
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Progress { transferred: u64, size: u64 },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub session: SessionId,
    pub transfer: TransferId,
    pub event: ProgressEvent,
}

/// Where a running transfer reports progress.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    session: SessionId,
    transfer: TransferId,
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ProgressSink {
    pub fn new(
        session: SessionId,
        transfer: TransferId,
        tx: mpsc::UnboundedSender<ProgressUpdate>,
    ) -> Self {
        Self {
            session,
            transfer,
            tx,
        }
    }

    pub fn transfer(&self) -> TransferId {
        self.transfer
    }

    pub fn progress(&self, transferred: u64, size: u64) {
        self.send(ProgressEvent::Progress { transferred, size });
    }

    pub fn failed(&self, message: impl Into<String>) {
        self.send(ProgressEvent::Failed(message.into()));
    }

    fn send(&self, event: ProgressEvent) {
        // Receiver gone means the client shut down
        let _ = self.tx.send(ProgressUpdate {
            session: self.session,
            transfer: self.transfer,
            event,
        });
    }
}

/// Adapter for the OBEX protocol layer.
#[async_trait]
pub trait ObexAdapter: Clone + Send + Sync + 'static {
    /// Perform the OBEX connect handshake over an open stream
    async fn connect(&self, stream: BtStream, target: Option<&[u8]>)
        -> Result<ObexLink, ObexError>;

    /// Create a transfer object on a link
    fn register_transfer(
        &self,
        link: &ObexLink,
        request: &TransferRequest,
    ) -> Result<TransferRegistration, ObexError>;

    /// Start moving bytes. Progress and failures arrive on `sink`.
    fn start_transfer(
        &self,
        link: &ObexLink,
        transfer: TransferId,
        direction: Direction,
        name: Option<&str>,
        sink: ProgressSink,
    ) -> Result<(), ObexError>;

    /// Drop a transfer object, aborting it if running
    fn unregister_transfer(&self, transfer: TransferId);

    /// Close the link and its stream
    fn disconnect(&self, link: &ObexLink);
}
