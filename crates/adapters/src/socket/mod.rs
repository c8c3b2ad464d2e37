// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bluetooth sockets: service discovery sessions and RFCOMM streams

mod rfcomm;

pub use rfcomm::RfcommSocketAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSocketAdapter, SocketCall};

use async_trait::async_trait;
use obc_core::BdAddr;
use std::fmt;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use uuid::Uuid;

/// PDU id of a service search attribute response.
pub const SDP_SVC_SEARCH_ATTR_RSP: u8 = 0x07;

/// Errors from socket operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocketError {
    #[error("connection refused: {0}")]
    Refused(String),
    #[error("i/o error: {0}")]
    Io(String),
    #[error("discovery session closed")]
    Closed,
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

/// Byte stream usable as an OBEX transport.
pub trait StreamIo: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin + 'static> StreamIo for T {}

/// An established RFCOMM stream.
pub struct BtStream {
    io: Box<dyn StreamIo>,
    peer: BdAddr,
    channel: u8,
}

impl BtStream {
    pub fn new(io: impl StreamIo, peer: BdAddr, channel: u8) -> Self {
        Self {
            io: Box::new(io),
            peer,
            channel,
        }
    }

    pub fn peer(&self) -> BdAddr {
        self.peer
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn into_io(self) -> Box<dyn StreamIo> {
        self.io
    }
}

impl fmt::Debug for BtStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BtStream")
            .field("peer", &self.peer)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

/// Handle for an open service discovery session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiscoveryHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfcommRequest {
    pub source: BdAddr,
    pub destination: BdAddr,
    pub channel: u8,
    pub security: SecurityLevel,
}

/// Inclusive range of attribute ids requested by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRange {
    pub start: u16,
    pub end: u16,
}

impl AttributeRange {
    pub const FULL: AttributeRange = AttributeRange {
        start: 0x0000,
        end: 0xffff,
    };
}

/// Raw outcome of a service search attribute request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResponse {
    /// Response PDU id
    pub pdu: u8,
    /// Non-zero when the peer reported an error
    pub status: u16,
    /// Attribute lists: a data element sequence with one sequence per record
    pub records: Vec<u8>,
}

/// Adapter for Bluetooth sockets.
#[async_trait]
pub trait SocketAdapter: Clone + Send + Sync + 'static {
    /// Open a discovery session and wait until it is writable
    async fn open_discovery(
        &self,
        source: &BdAddr,
        destination: &BdAddr,
    ) -> Result<DiscoveryHandle, SocketError>;

    /// Issue a service search attribute request and drive it to completion
    async fn search_attributes(
        &self,
        handle: DiscoveryHandle,
        service: Uuid,
        range: AttributeRange,
    ) -> Result<SearchResponse, SocketError>;

    /// Close a discovery session
    fn close_discovery(&self, handle: DiscoveryHandle);

    /// Connect an RFCOMM stream
    async fn connect_rfcomm(&self, request: &RfcommRequest) -> Result<BtStream, SocketError>;
}
