// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::bluez::{BluezAdapter, BluezError};
use crate::socket::{
    AttributeRange, BtStream, DiscoveryHandle, RfcommRequest, SearchResponse, SocketAdapter,
    SocketError,
};
use async_trait::async_trait;
use obc_core::{BdAddr, ObjectPath};
use tracing::Instrument;
use uuid::Uuid;

/// Wrapper that adds tracing to any BluezAdapter
#[derive(Clone)]
pub struct TracedBluez<B> {
    inner: B,
}

impl<B> TracedBluez<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<B: BluezAdapter> BluezAdapter for TracedBluez<B> {
    async fn default_adapter(&self) -> Result<ObjectPath, BluezError> {
        async {
            let start = std::time::Instant::now();
            let result = self.inner.default_adapter().await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(path) => tracing::info!(adapter = %path, elapsed_ms, "adapter resolved"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "no default adapter"),
            }
            result
        }
        .instrument(tracing::info_span!("bluez.default_adapter"))
        .await
    }

    async fn find_adapter(&self, source: &BdAddr) -> Result<ObjectPath, BluezError> {
        async {
            let start = std::time::Instant::now();
            let result = self.inner.find_adapter(source).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(path) => tracing::info!(adapter = %path, elapsed_ms, "adapter resolved"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "adapter lookup failed"),
            }
            result
        }
        .instrument(tracing::info_span!("bluez.find_adapter", source = %source))
        .await
    }

    async fn request_session(&self, adapter: &ObjectPath) -> Result<(), BluezError> {
        async {
            let start = std::time::Instant::now();
            let result = self.inner.request_session(adapter).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "session reserved"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "session request failed"),
            }
            result
        }
        .instrument(tracing::info_span!("bluez.request_session", adapter = %adapter))
        .await
    }

    fn release_session(&self, adapter: &ObjectPath) {
        tracing::info_span!("bluez.release_session", adapter = %adapter)
            .in_scope(|| tracing::debug!("releasing"));
        self.inner.release_session(adapter);
    }
}

/// Wrapper that adds tracing to any SocketAdapter
#[derive(Clone)]
pub struct TracedSockets<K> {
    inner: K,
}

impl<K> TracedSockets<K> {
    pub fn new(inner: K) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<K: SocketAdapter> SocketAdapter for TracedSockets<K> {
    async fn open_discovery(
        &self,
        source: &BdAddr,
        destination: &BdAddr,
    ) -> Result<DiscoveryHandle, SocketError> {
        let result = self.inner.open_discovery(source, destination).await;
        tracing::info_span!("sdp.open", %destination).in_scope(|| match &result {
            Ok(handle) => tracing::debug!(handle = handle.0, "discovery session open"),
            Err(e) => tracing::warn!(error = %e, "discovery connect failed"),
        });
        result
    }

    async fn search_attributes(
        &self,
        handle: DiscoveryHandle,
        service: Uuid,
        range: AttributeRange,
    ) -> Result<SearchResponse, SocketError> {
        async {
            let start = std::time::Instant::now();
            let result = self.inner.search_attributes(handle, service, range).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(rsp) => tracing::info!(
                    pdu = rsp.pdu,
                    status = rsp.status,
                    bytes = rsp.records.len(),
                    elapsed_ms,
                    "search complete"
                ),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "search failed"),
            }
            result
        }
        .instrument(tracing::info_span!("sdp.search", handle = handle.0, %service))
        .await
    }

    fn close_discovery(&self, handle: DiscoveryHandle) {
        tracing::debug!(handle = handle.0, "closing discovery session");
        self.inner.close_discovery(handle);
    }

    async fn connect_rfcomm(&self, request: &RfcommRequest) -> Result<BtStream, SocketError> {
        async {
            tracing::info!(security = ?request.security, "connecting");
            let start = std::time::Instant::now();
            let result = self.inner.connect_rfcomm(request).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(stream) => tracing::info!(
                    peer = %stream.peer(),
                    elapsed_ms,
                    "rfcomm connected"
                ),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "rfcomm connect failed"),
            }
            result
        }
        .instrument(tracing::info_span!(
            "rfcomm.connect",
            destination = %request.destination,
            channel = request.channel
        ))
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
