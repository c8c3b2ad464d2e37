// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transports: connectors that turn an address into a byte stream

pub mod bluetooth;
pub mod sdp;

pub use bluetooth::{BluetoothConnector, LinkStep, Stage, BLUETOOTH};

use crate::event::EventSender;
use obc_adapters::BtStream;
use obc_core::{AttemptId, BdAddr, ObcError, OpId};
use std::collections::HashMap;

/// Parameters of one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub source: Option<BdAddr>,
    pub destination: BdAddr,
    /// Service class UUID in canonical 128-bit form
    pub service_uuid: String,
    /// Zero means "discover the channel"
    pub channel: u8,
}

/// Completion of one connector step.
#[derive(Debug)]
pub struct TransportEvent {
    pub attempt: AttemptId,
    pub op: OpId,
    pub step: LinkStep,
}

/// Terminal outcome of an attempt, reported exactly once.
#[derive(Debug)]
pub struct TransportResult {
    pub attempt: AttemptId,
    pub result: Result<BtStream, ObcError>,
}

/// A connector selected by name.
pub trait Transport: Send {
    fn name(&self) -> &str;

    /// Start an attempt. Errors here mean no attempt was allocated.
    fn connect(
        &mut self,
        request: ConnectRequest,
        events: &EventSender,
    ) -> Result<AttemptId, ObcError>;

    /// Cancel an attempt and release everything it holds. Unknown ids are ignored.
    fn disconnect(&mut self, attempt: AttemptId);

    /// Feed a step completion. Returns the attempt's result once it is terminal.
    fn handle(&mut self, event: TransportEvent, events: &EventSender)
        -> Option<TransportResult>;
}

/// Name-keyed table of transports.
#[derive(Default)]
pub struct TransportRegistry {
    transports: HashMap<String, Box<dyn Transport>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transport, replacing any with the same name.
    pub fn register(&mut self, transport: impl Transport + 'static) {
        self.transports
            .insert(transport.name().to_string(), Box::new(transport));
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Transport + 'static)> {
        self.transports.get_mut(name).map(|t| t.as_mut())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transports.contains_key(name)
    }
}
