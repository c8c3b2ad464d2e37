// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bluetooth connector.
//!
//! An attempt walks adapter lookup, adapter reservation and then either a
//! direct RFCOMM connect or service discovery followed by one. Every step
//! is a spawned call tracked in the attempt's [`PendingCalls`]; the first
//! failure is terminal and tears the attempt down.

use super::{sdp, ConnectRequest, Transport, TransportEvent, TransportResult};
use crate::event::{Event, EventSender};
use crate::pending::{CallKind, PendingCalls};
use obc_adapters::{
    AttributeRange, BluezAdapter, BluezError, BtStream, DiscoveryHandle, RfcommRequest,
    SearchResponse, SecurityLevel, SocketAdapter, SocketError,
};
use obc_core::{parse_service_uuid, AttemptId, BdAddr, ObcError, ObjectPath, Sequence};
use std::collections::HashMap;
use std::future::Future;
use uuid::Uuid;

/// Name the Bluetooth connector registers under.
pub const BLUETOOTH: &str = "Bluetooth";

/// Completion payload of one connector step.
#[derive(Debug)]
pub enum LinkStep {
    AdapterResolved(Result<ObjectPath, BluezError>),
    SessionReserved(Result<(), BluezError>),
    DiscoveryOpened(Result<DiscoveryHandle, SocketError>),
    SearchCompleted(Result<SearchResponse, SocketError>),
    StreamConnected(Result<BtStream, SocketError>),
}

/// Where an attempt is waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingAdapter,
    Reserving,
    OpeningDiscovery,
    Searching,
    Linking,
}

struct Attempt {
    source: Option<BdAddr>,
    destination: BdAddr,
    channel: u8,
    service_uuid: String,
    stage: Stage,
    adapter: Option<ObjectPath>,
    reserved: bool,
    discovery: Option<DiscoveryHandle>,
    calls: PendingCalls,
}

impl Attempt {
    fn new(request: ConnectRequest) -> Self {
        Self {
            source: request.source,
            destination: request.destination,
            channel: request.channel,
            service_uuid: request.service_uuid,
            stage: Stage::ResolvingAdapter,
            adapter: None,
            reserved: false,
            discovery: None,
            calls: PendingCalls::new(),
        }
    }

    fn local(&self) -> BdAddr {
        self.source.unwrap_or(BdAddr::ANY)
    }
}

pub struct BluetoothConnector<B, K> {
    bluez: B,
    sockets: K,
    ids: Sequence,
    attempts: HashMap<AttemptId, Attempt>,
}

impl<B, K> BluetoothConnector<B, K>
where
    B: BluezAdapter,
    K: SocketAdapter,
{
    pub fn new(bluez: B, sockets: K) -> Self {
        Self {
            bluez,
            sockets,
            ids: Sequence::new(),
            attempts: HashMap::new(),
        }
    }

    /// Current stage of a live attempt
    pub fn stage(&self, attempt: AttemptId) -> Option<Stage> {
        self.attempts.get(&attempt).map(|a| a.stage)
    }

    pub fn active_attempts(&self) -> usize {
        self.attempts.len()
    }

    /// Apply one step. `Ok(Some(stream))` means the attempt is linked.
    fn advance(
        &mut self,
        id: AttemptId,
        step: LinkStep,
        events: &EventSender,
    ) -> Result<Option<BtStream>, ObcError> {
        let bluez = self.bluez.clone();
        let sockets = self.sockets.clone();
        let Some(attempt) = self.attempts.get_mut(&id) else {
            return Ok(None);
        };

        match step {
            LinkStep::AdapterResolved(result) => {
                let adapter = result.map_err(|e| {
                    tracing::warn!(attempt = %id, error = %e, "adapter lookup failed");
                    ObcError::no_adapter()
                })?;
                tracing::debug!(attempt = %id, adapter = %adapter, "requesting session");
                attempt.adapter = Some(adapter.clone());
                attempt.stage = Stage::Reserving;
                spawn_step(
                    &mut attempt.calls,
                    CallKind::SessionReserve,
                    events,
                    id,
                    async move { LinkStep::SessionReserved(bluez.request_session(&adapter).await) },
                );
                Ok(None)
            }
            LinkStep::SessionReserved(result) => {
                result.map_err(|e| {
                    tracing::warn!(attempt = %id, error = %e, "session request failed");
                    ObcError::reservation_failed()
                })?;
                attempt.reserved = true;
                if attempt.channel > 0 {
                    start_link(attempt, sockets, events, id);
                } else {
                    let service = parse_service_uuid(&attempt.service_uuid)?;
                    start_discovery(attempt, sockets, events, id, service);
                }
                Ok(None)
            }
            LinkStep::DiscoveryOpened(result) => {
                let handle = result.map_err(|e| {
                    tracing::warn!(attempt = %id, error = %e, "discovery connect failed");
                    ObcError::service_not_found()
                })?;
                attempt.discovery = Some(handle);
                let service = parse_service_uuid(&attempt.service_uuid)?;
                attempt.stage = Stage::Searching;
                spawn_step(
                    &mut attempt.calls,
                    CallKind::DiscoverySearch,
                    events,
                    id,
                    async move {
                        LinkStep::SearchCompleted(
                            sockets
                                .search_attributes(handle, service, AttributeRange::FULL)
                                .await,
                        )
                    },
                );
                Ok(None)
            }
            LinkStep::SearchCompleted(result) => {
                if let Some(handle) = attempt.discovery.take() {
                    sockets.close_discovery(handle);
                }
                let response = result.map_err(|e| {
                    tracing::warn!(attempt = %id, error = %e, "service search failed");
                    ObcError::service_not_found()
                })?;
                let channel =
                    sdp::find_rfcomm_channel(&response).ok_or_else(ObcError::service_not_found)?;
                tracing::info!(attempt = %id, channel, "service record found");
                attempt.channel = channel;
                start_link(attempt, sockets, events, id);
                Ok(None)
            }
            LinkStep::StreamConnected(result) => result
                .map(Some)
                .map_err(|e| ObcError::connect_failed(e.to_string())),
        }
    }

    /// Remove an attempt and release what it holds: outstanding calls are
    /// cancelled, discovery is closed, and a held reservation is released once.
    fn teardown(&mut self, id: AttemptId) {
        let Some(mut attempt) = self.attempts.remove(&id) else {
            return;
        };
        let cancelled = attempt.calls.cancel_all();
        if let Some(handle) = attempt.discovery.take() {
            self.sockets.close_discovery(handle);
        }
        if attempt.reserved {
            if let Some(adapter) = &attempt.adapter {
                self.bluez.release_session(adapter);
            }
        }
        tracing::debug!(attempt = %id, cancelled, reserved = attempt.reserved, "attempt torn down");
    }
}

impl<B, K> Transport for BluetoothConnector<B, K>
where
    B: BluezAdapter,
    K: SocketAdapter,
{
    fn name(&self) -> &str {
        BLUETOOTH
    }

    fn connect(
        &mut self,
        request: ConnectRequest,
        events: &EventSender,
    ) -> Result<AttemptId, ObcError> {
        let id: AttemptId = self.ids.next();
        tracing::info!(
            attempt = %id,
            destination = %request.destination,
            channel = request.channel,
            "connecting"
        );

        let mut attempt = Attempt::new(request);
        let bluez = self.bluez.clone();
        let source = attempt.source;
        spawn_step(
            &mut attempt.calls,
            CallKind::AdapterResolve,
            events,
            id,
            async move {
                let result = match source {
                    Some(addr) => bluez.find_adapter(&addr).await,
                    None => bluez.default_adapter().await,
                };
                LinkStep::AdapterResolved(result)
            },
        );
        self.attempts.insert(id, attempt);
        Ok(id)
    }

    fn disconnect(&mut self, attempt: AttemptId) {
        if self.attempts.contains_key(&attempt) {
            tracing::info!(attempt = %attempt, "disconnecting");
            self.teardown(attempt);
        } else {
            tracing::debug!(attempt = %attempt, "disconnect of unknown attempt ignored");
        }
    }

    fn handle(
        &mut self,
        event: TransportEvent,
        events: &EventSender,
    ) -> Option<TransportResult> {
        let id = event.attempt;
        let Some(attempt) = self.attempts.get_mut(&id) else {
            tracing::debug!(attempt = %id, "completion for finished attempt dropped");
            return None;
        };
        if attempt.calls.complete(event.op).is_none() {
            tracing::debug!(attempt = %id, op = %event.op, "stale completion dropped");
            return None;
        }

        match self.advance(id, event.step, events) {
            Ok(None) => None,
            Ok(Some(stream)) => {
                tracing::info!(attempt = %id, channel = stream.channel(), "linked");
                self.teardown(id);
                Some(TransportResult {
                    attempt: id,
                    result: Ok(stream),
                })
            }
            Err(e) => {
                tracing::warn!(attempt = %id, error = %e, "attempt failed");
                self.teardown(id);
                Some(TransportResult {
                    attempt: id,
                    result: Err(e),
                })
            }
        }
    }
}

fn start_link<K: SocketAdapter>(
    attempt: &mut Attempt,
    sockets: K,
    events: &EventSender,
    id: AttemptId,
) {
    let request = RfcommRequest {
        source: attempt.local(),
        destination: attempt.destination,
        channel: attempt.channel,
        security: SecurityLevel::Low,
    };
    attempt.stage = Stage::Linking;
    spawn_step(
        &mut attempt.calls,
        CallKind::StreamConnect,
        events,
        id,
        async move { LinkStep::StreamConnected(sockets.connect_rfcomm(&request).await) },
    );
}

fn start_discovery<K: SocketAdapter>(
    attempt: &mut Attempt,
    sockets: K,
    events: &EventSender,
    id: AttemptId,
    service: Uuid,
) {
    tracing::debug!(attempt = %id, %service, "discovering channel");
    let (source, destination) = (attempt.local(), attempt.destination);
    attempt.stage = Stage::OpeningDiscovery;
    spawn_step(
        &mut attempt.calls,
        CallKind::DiscoveryConnect,
        events,
        id,
        async move {
            LinkStep::DiscoveryOpened(sockets.open_discovery(&source, &destination).await)
        },
    );
}

fn spawn_step<F>(
    calls: &mut PendingCalls,
    kind: CallKind,
    events: &EventSender,
    attempt: AttemptId,
    step: F,
) where
    F: Future<Output = LinkStep> + Send + 'static,
{
    let events = events.clone();
    calls.track(kind, move |op| {
        tokio::spawn(async move {
            let step = step.await;
            events.send(Event::Transport {
                transport: BLUETOOTH.to_string(),
                event: TransportEvent { attempt, op, step },
            });
        })
    });
}

#[cfg(test)]
#[path = "bluetooth_tests.rs"]
mod tests;
