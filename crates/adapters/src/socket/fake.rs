// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake sockets for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    AttributeRange, BtStream, DiscoveryHandle, RfcommRequest, SearchResponse, SocketAdapter,
    SocketError, SDP_SVC_SEARCH_ATTR_RSP,
};
use crate::hold::HeldCalls;
use async_trait::async_trait;
use obc_core::BdAddr;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Recorded socket call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketCall {
    OpenDiscovery {
        source: BdAddr,
        destination: BdAddr,
    },
    Search {
        handle: DiscoveryHandle,
        service: Uuid,
        range: AttributeRange,
    },
    CloseDiscovery {
        handle: DiscoveryHandle,
    },
    ConnectRfcomm(RfcommRequest),
}

struct FakeSocketState {
    next_handle: u64,
    open: HashSet<DiscoveryHandle>,
    open_error: Option<SocketError>,
    search: Result<SearchResponse, SocketError>,
    connect_error: Option<SocketError>,
    hold_opens: bool,
    hold_searches: bool,
    hold_connects: bool,
    calls: Vec<SocketCall>,
}

/// Fake sockets. Searches return an empty record list until configured.
#[derive(Clone)]
pub struct FakeSocketAdapter {
    inner: Arc<Mutex<FakeSocketState>>,
    held: HeldCalls,
}

impl Default for FakeSocketAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeSocketState {
                next_handle: 0,
                open: HashSet::new(),
                open_error: None,
                search: Ok(SearchResponse {
                    pdu: SDP_SVC_SEARCH_ATTR_RSP,
                    status: 0,
                    records: vec![0x35, 0x00],
                }),
                connect_error: None,
                hold_opens: false,
                hold_searches: false,
                hold_connects: false,
                calls: Vec::new(),
            })),
            held: HeldCalls::default(),
        }
    }
}

impl FakeSocketAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SocketCall> {
        self.inner.lock().calls.clone()
    }

    /// RFCOMM connect requests, in order
    pub fn rfcomm_requests(&self) -> Vec<RfcommRequest> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                SocketCall::ConnectRfcomm(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of discovery sessions opened and not yet closed
    pub fn open_discoveries(&self) -> usize {
        self.inner.lock().open.len()
    }

    pub fn set_open_error(&self, error: SocketError) {
        self.inner.lock().open_error = Some(error);
    }

    /// Set the response every search returns
    pub fn set_search_response(&self, response: SearchResponse) {
        self.inner.lock().search = Ok(response);
    }

    pub fn set_search_error(&self, error: SocketError) {
        self.inner.lock().search = Err(error);
    }

    pub fn set_connect_error(&self, error: SocketError) {
        self.inner.lock().connect_error = Some(error);
    }

    pub fn hold_opens(&self, hold: bool) {
        self.inner.lock().hold_opens = hold;
    }

    pub fn hold_searches(&self, hold: bool) {
        self.inner.lock().hold_searches = hold;
    }

    pub fn hold_connects(&self, hold: bool) {
        self.inner.lock().hold_connects = hold;
    }

    /// Number of calls currently suspended
    pub fn held_calls(&self) -> usize {
        self.held.count()
    }
}

#[async_trait]
impl SocketAdapter for FakeSocketAdapter {
    async fn open_discovery(
        &self,
        source: &BdAddr,
        destination: &BdAddr,
    ) -> Result<DiscoveryHandle, SocketError> {
        let (hold, result) = {
            let mut inner = self.inner.lock();
            inner.calls.push(SocketCall::OpenDiscovery {
                source: *source,
                destination: *destination,
            });
            let result = match inner.open_error.clone() {
                Some(e) => Err(e),
                None => {
                    inner.next_handle += 1;
                    let handle = DiscoveryHandle(inner.next_handle);
                    inner.open.insert(handle);
                    Ok(handle)
                }
            };
            (inner.hold_opens, result)
        };
        if hold {
            return self.held.park().await;
        }
        result
    }

    async fn search_attributes(
        &self,
        handle: DiscoveryHandle,
        service: Uuid,
        range: AttributeRange,
    ) -> Result<SearchResponse, SocketError> {
        let (hold, result) = {
            let mut inner = self.inner.lock();
            inner.calls.push(SocketCall::Search {
                handle,
                service,
                range,
            });
            let result = if inner.open.contains(&handle) {
                inner.search.clone()
            } else {
                Err(SocketError::Closed)
            };
            (inner.hold_searches, result)
        };
        if hold {
            return self.held.park().await;
        }
        result
    }

    fn close_discovery(&self, handle: DiscoveryHandle) {
        let mut inner = self.inner.lock();
        inner.calls.push(SocketCall::CloseDiscovery { handle });
        inner.open.remove(&handle);
    }

    async fn connect_rfcomm(&self, request: &RfcommRequest) -> Result<BtStream, SocketError> {
        let (hold, error) = {
            let mut inner = self.inner.lock();
            inner.calls.push(SocketCall::ConnectRfcomm(request.clone()));
            (inner.hold_connects, inner.connect_error.clone())
        };
        if hold {
            return self.held.park().await;
        }
        if let Some(e) = error {
            return Err(e);
        }
        let (local, _peer) = tokio::io::duplex(64);
        Ok(BtStream::new(local, request.destination, request.channel))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
