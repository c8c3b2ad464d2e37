// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kernel RFCOMM socket adapter

use super::{
    AttributeRange, BtStream, DiscoveryHandle, RfcommRequest, SearchResponse, SecurityLevel,
    SocketAdapter, SocketError,
};
use async_trait::async_trait;
use bluer::rfcomm::{self, Socket, SocketAddr};
use bluer::Address;
use obc_core::BdAddr;
use std::io;
use uuid::Uuid;

/// Socket adapter backed by the kernel's Bluetooth sockets.
///
/// Streams are real RFCOMM connections. Service discovery has no backend
/// here: opening a discovery session fails with
/// [`SocketError::Unsupported`], which callers see as a missing record.
/// Requests that name a channel never need it.
#[derive(Clone, Copy, Debug, Default)]
pub struct RfcommSocketAdapter;

impl RfcommSocketAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SocketAdapter for RfcommSocketAdapter {
    async fn open_discovery(
        &self,
        _source: &BdAddr,
        destination: &BdAddr,
    ) -> Result<DiscoveryHandle, SocketError> {
        tracing::warn!(%destination, "service discovery requested without a backend");
        Err(SocketError::Unsupported("service discovery"))
    }

    async fn search_attributes(
        &self,
        _handle: DiscoveryHandle,
        _service: Uuid,
        _range: AttributeRange,
    ) -> Result<SearchResponse, SocketError> {
        Err(SocketError::Unsupported("service discovery"))
    }

    fn close_discovery(&self, _handle: DiscoveryHandle) {}

    async fn connect_rfcomm(&self, request: &RfcommRequest) -> Result<BtStream, SocketError> {
        let socket = Socket::new().map_err(io_error)?;
        if !request.source.is_any() {
            socket
                .bind(SocketAddr::new(address(request.source), 0))
                .map_err(io_error)?;
        }
        socket
            .set_security(rfcomm::Security {
                level: security_level(request.security),
                key_size: 0,
            })
            .map_err(io_error)?;

        let stream = socket
            .connect(SocketAddr::new(
                address(request.destination),
                request.channel,
            ))
            .await
            .map_err(io_error)?;
        Ok(BtStream::new(stream, request.destination, request.channel))
    }
}

fn address(addr: BdAddr) -> Address {
    Address::new(addr.octets())
}

fn security_level(level: SecurityLevel) -> rfcomm::SecurityLevel {
    match level {
        SecurityLevel::Low => rfcomm::SecurityLevel::Low,
        SecurityLevel::Medium => rfcomm::SecurityLevel::Medium,
        SecurityLevel::High => rfcomm::SecurityLevel::High,
    }
}

fn io_error(e: io::Error) -> SocketError {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => SocketError::Refused(e.to_string()),
        _ => SocketError::Io(e.to_string()),
    }
}

#[cfg(test)]
#[path = "rfcomm_tests.rs"]
mod tests;
