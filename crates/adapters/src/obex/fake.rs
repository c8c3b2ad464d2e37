// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake OBEX layer for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    Direction, ObexAdapter, ObexError, ObexLink, ProgressSink, TransferRegistration,
    TransferRequest,
};
use crate::hold::HeldCalls;
use crate::socket::{BtStream, StreamIo};
use async_trait::async_trait;
use obc_core::{ObjectPath, TransferId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Recorded OBEX call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObexCall {
    Connect {
        channel: u8,
        target: Option<Vec<u8>>,
    },
    Register(TransferRequest),
    Start {
        transfer: TransferId,
        direction: Direction,
        name: Option<String>,
    },
    Unregister {
        transfer: TransferId,
    },
    Disconnect {
        link: ObexLink,
    },
}

struct Running {
    sink: ProgressSink,
    size: u64,
}

struct FakeObexState {
    next_link: u64,
    connect_error: Option<ObexError>,
    register_error: Option<ObexError>,
    start_error: Option<ObexError>,
    hold_connects: bool,
    export_paths: bool,
    transfer_size: u64,
    sizes: HashMap<TransferId, u64>,
    running: HashMap<TransferId, Running>,
    /// Streams owned by live links, closed on disconnect
    links: HashMap<ObexLink, Box<dyn StreamIo>>,
    calls: Vec<ObexCall>,
}

/// Fake OBEX layer. Transfers are exported with a path and a size of 100 bytes.
#[derive(Clone)]
pub struct FakeObexAdapter {
    inner: Arc<Mutex<FakeObexState>>,
    held: HeldCalls,
}

impl Default for FakeObexAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeObexState {
                next_link: 0,
                connect_error: None,
                register_error: None,
                start_error: None,
                hold_connects: false,
                export_paths: true,
                transfer_size: 100,
                sizes: HashMap::new(),
                running: HashMap::new(),
                links: HashMap::new(),
                calls: Vec::new(),
            })),
            held: HeldCalls::default(),
        }
    }
}

impl FakeObexAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ObexCall> {
        self.inner.lock().calls.clone()
    }

    /// Started transfers with the direction they were started in
    pub fn started(&self) -> Vec<(TransferId, Direction)> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ObexCall::Start {
                    transfer,
                    direction,
                    ..
                } => Some((*transfer, *direction)),
                _ => None,
            })
            .collect()
    }

    pub fn unregistered(&self) -> Vec<TransferId> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ObexCall::Unregister { transfer } => Some(*transfer),
                _ => None,
            })
            .collect()
    }

    pub fn disconnects(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, ObexCall::Disconnect { .. }))
            .count()
    }

    pub fn set_connect_error(&self, error: ObexError) {
        self.inner.lock().connect_error = Some(error);
    }

    pub fn set_register_error(&self, error: ObexError) {
        self.inner.lock().register_error = Some(error);
    }

    pub fn set_start_error(&self, error: Option<ObexError>) {
        self.inner.lock().start_error = error;
    }

    pub fn hold_connects(&self, hold: bool) {
        self.inner.lock().hold_connects = hold;
    }

    /// Whether new transfers get an external-facing path
    pub fn export_paths(&self, export: bool) {
        self.inner.lock().export_paths = export;
    }

    /// Size reported for transfers registered from now on
    pub fn set_transfer_size(&self, size: u64) {
        self.inner.lock().transfer_size = size;
    }

    /// Report progress on a running transfer. Returns false if it is not running.
    pub fn emit_progress(&self, transfer: TransferId, transferred: u64) -> bool {
        let inner = self.inner.lock();
        match inner.running.get(&transfer) {
            Some(run) => {
                run.sink.progress(transferred, run.size);
                true
            }
            None => false,
        }
    }

    /// Report all bytes of a running transfer as moved
    pub fn complete(&self, transfer: TransferId) -> bool {
        let size = self.inner.lock().running.get(&transfer).map(|r| r.size);
        match size {
            Some(size) => self.emit_progress(transfer, size),
            None => false,
        }
    }

    /// Report a mid-transfer failure
    pub fn emit_error(&self, transfer: TransferId, message: &str) -> bool {
        let inner = self.inner.lock();
        match inner.running.get(&transfer) {
            Some(run) => {
                run.sink.failed(message);
                true
            }
            None => false,
        }
    }

    /// Links still holding their stream
    pub fn open_links(&self) -> usize {
        self.inner.lock().links.len()
    }

    /// Number of calls currently suspended
    pub fn held_calls(&self) -> usize {
        self.held.count()
    }
}

#[async_trait]
impl ObexAdapter for FakeObexAdapter {
    async fn connect(
        &self,
        stream: BtStream,
        target: Option<&[u8]>,
    ) -> Result<ObexLink, ObexError> {
        let (hold, result) = {
            let mut inner = self.inner.lock();
            inner.calls.push(ObexCall::Connect {
                channel: stream.channel(),
                target: target.map(<[u8]>::to_vec),
            });
            let result = match inner.connect_error.clone() {
                Some(e) => Err(e),
                None => {
                    inner.next_link += 1;
                    Ok(ObexLink::new(inner.next_link))
                }
            };
            (inner.hold_connects, result)
        };
        if hold {
            return self.held.park().await;
        }
        if let Ok(link) = &result {
            self.inner.lock().links.insert(*link, stream.into_io());
        }
        result
    }

    fn register_transfer(
        &self,
        _link: &ObexLink,
        request: &TransferRequest,
    ) -> Result<TransferRegistration, ObexError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ObexCall::Register(request.clone()));
        if let Some(e) = inner.register_error.clone() {
            return Err(e);
        }
        let path = if inner.export_paths {
            ObjectPath::parse(format!("/org/openobex/transfer{}", request.id)).ok()
        } else {
            None
        };
        let size = inner.transfer_size;
        inner.sizes.insert(request.id, size);
        Ok(TransferRegistration { path, size })
    }

    fn start_transfer(
        &self,
        _link: &ObexLink,
        transfer: TransferId,
        direction: Direction,
        name: Option<&str>,
        sink: ProgressSink,
    ) -> Result<(), ObexError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ObexCall::Start {
            transfer,
            direction,
            name: name.map(str::to_string),
        });
        if let Some(e) = inner.start_error.clone() {
            return Err(e);
        }
        let size = inner.sizes.get(&transfer).copied().unwrap_or(0);
        inner.running.insert(transfer, Running { sink, size });
        Ok(())
    }

    fn unregister_transfer(&self, transfer: TransferId) {
        let mut inner = self.inner.lock();
        inner.calls.push(ObexCall::Unregister { transfer });
        inner.running.remove(&transfer);
        inner.sizes.remove(&transfer);
    }

    fn disconnect(&self, link: &ObexLink) {
        let mut inner = self.inner.lock();
        inner.calls.push(ObexCall::Disconnect { link: *link });
        inner.links.remove(link);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
