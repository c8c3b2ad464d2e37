// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The client: session lookup and creation, connect handling, and the
//! single-threaded event loop every completion is funnelled through.
//!
//! Adapter calls run as spawned tasks tracked by a [`PendingCalls`] owned
//! by the session or connector attempt that issued them. Their results come
//! back as [`Event`]s tagged with the owner and op id; a result whose op is
//! no longer tracked is dropped.

mod agent;
mod lifecycle;
mod transfers;

pub use transfers::{GetRequest, Notifier, PullRequest, PutRequest, SendRequest};

use crate::config::ClientConfig;
use crate::driver::DriverRegistry;
use crate::event::{Event, EventSender, Incoming, SessionOutcome};
use crate::pending::{CallKind, PendingCalls};
use crate::session::{Session, SessionKey, SessionRegistry, SessionState};
use crate::transport::{ConnectRequest, TransportEvent, TransportRegistry, TransportResult};
use obc_adapters::{AgentAdapter, BusAdapter, ObexAdapter, ObexError, ObexLink, ProgressUpdate};
use obc_core::{BdAddr, BusName, ObcError, ServiceName, SessionId};
use std::future::Future;
use tokio::sync::{mpsc, oneshot};

/// Client adapter dependencies
pub struct ClientDeps<O, A, U> {
    pub obex: O,
    pub agents: A,
    pub bus: U,
}

/// What a caller asks `find_or_create` for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub source: Option<BdAddr>,
    pub destination: BdAddr,
    pub service: ServiceName,
    /// Zero asks for service discovery
    pub channel: u8,
    pub owner: Option<BusName>,
}

impl SessionRequest {
    pub fn new(destination: BdAddr, service: impl Into<ServiceName>) -> Self {
        Self {
            source: None,
            destination,
            service: service.into(),
            channel: 0,
            owner: None,
        }
    }

    pub fn source(mut self, source: BdAddr) -> Self {
        self.source = Some(source);
        self
    }

    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    pub fn owner(mut self, owner: impl Into<BusName>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Build from the string forms used on the IPC surface.
    pub fn parse(
        source: Option<&str>,
        destination: &str,
        service: &str,
        channel: u8,
        owner: Option<&str>,
    ) -> Result<Self, ObcError> {
        let source = source.map(|s| s.parse::<BdAddr>()).transpose()?;
        let mut request = Self::new(destination.parse()?, service).channel(channel);
        request.source = source;
        request.owner = owner.map(BusName::from);
        Ok(request)
    }

    fn into_key(self) -> SessionKey {
        SessionKey {
            source: self.source,
            destination: self.destination,
            service: self.service,
            channel: self.channel,
            owner: self.owner,
        }
    }
}

/// Handle returned to each `find_or_create` caller.
///
/// The caller owns one session reference. `ready` resolves once, when the
/// shared connect finishes or the session is torn down first.
#[derive(Debug)]
pub struct Connecting {
    pub session: SessionId,
    pub ready: oneshot::Receiver<Result<(), ObcError>>,
}

pub struct Client<O, A, U> {
    obex: O,
    agents: A,
    bus: U,
    config: ClientConfig,
    transports: TransportRegistry,
    drivers: DriverRegistry,
    sessions: SessionRegistry,
    events: EventSender,
    event_rx: mpsc::UnboundedReceiver<Event>,
    progress_tx: mpsc::UnboundedSender<ProgressUpdate>,
    progress_rx: mpsc::UnboundedReceiver<ProgressUpdate>,
}

impl<O, A, U> Client<O, A, U>
where
    O: ObexAdapter,
    A: AgentAdapter,
    U: BusAdapter,
{
    pub fn new(
        deps: ClientDeps<O, A, U>,
        config: ClientConfig,
        transports: TransportRegistry,
        drivers: DriverRegistry,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        Self {
            obex: deps.obex,
            agents: deps.agents,
            bus: deps.bus,
            config,
            transports,
            drivers,
            sessions: SessionRegistry::new(),
            events: EventSender::new(event_tx),
            event_rx,
            progress_tx,
            progress_rx,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Return a session for the request, reusing one when possible.
    ///
    /// A connected session matching the request is reused and `ready`
    /// resolves at once. An in-flight session started for the identical
    /// request is shared and `ready` resolves with its connect. Otherwise a
    /// new session starts connecting.
    pub fn find_or_create(&mut self, request: SessionRequest) -> Result<Connecting, ObcError> {
        let key = request.into_key();
        let (tx, ready) = oneshot::channel();

        if let Some(id) = self.sessions.find_connected(&key) {
            if let Some(session) = self.sessions.get_mut(id) {
                let refs = session.refs.acquire();
                tracing::debug!(session = %id, refs, "reusing connected session");
                // Receiver is still in hand
                let _ = tx.send(Ok(()));
                return Ok(Connecting { session: id, ready });
            }
        }

        if let Some(id) = self.sessions.find_connecting(&key) {
            if let Some(session) = self.sessions.get_mut(id) {
                let refs = session.refs.acquire();
                tracing::debug!(session = %id, refs, "joining in-flight connect");
                session.waiters.push(tx);
                return Ok(Connecting { session: id, ready });
            }
        }

        let driver = self.drivers.find(key.service.as_str()).ok_or_else(|| {
            ObcError::invalid_arguments(format!("Unknown service: {}", key.service))
        })?;
        let transport_name = self.config.transport.clone();
        let Some(transport) = self.transports.get_mut(&transport_name) else {
            return Err(ObcError::invalid_arguments(format!(
                "Unknown transport: {transport_name}"
            )));
        };

        let id = self.sessions.next_session_id();
        let mut session = Session::new(id, key.clone(), transport_name, driver.clone());
        if let Some(owner) = key.owner.clone() {
            watch_owner(&self.bus, &self.events, &mut session, owner);
        }

        // An early failure drops the session, aborting the owner watch
        let attempt = transport.connect(
            ConnectRequest {
                source: key.source,
                destination: key.destination,
                service_uuid: driver.uuid().to_string(),
                channel: key.channel,
            },
            &self.events,
        )?;
        tracing::info!(
            session = %id,
            %attempt,
            service = %key.service,
            destination = %key.destination,
            "session connecting"
        );

        session.attempt = Some(attempt);
        session.state = SessionState::Connecting;
        session.waiters.push(tx);
        self.sessions.insert(session);
        self.sessions.add_connecting(id);
        Ok(Connecting { session: id, ready })
    }

    /// Wait for the next completion or progress update.
    pub async fn next_event(&mut self) -> Option<Incoming> {
        tokio::select! {
            Some(event) = self.event_rx.recv() => Some(Incoming::Event(event)),
            Some(update) = self.progress_rx.recv() => Some(Incoming::Progress(update)),
            else => None,
        }
    }

    pub fn handle(&mut self, incoming: Incoming) {
        match incoming {
            Incoming::Event(event) => self.handle_event(event),
            Incoming::Progress(update) => self.handle_progress(update),
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Transport { transport, event } => self.handle_transport(&transport, event),
            Event::Session {
                session,
                op,
                outcome,
            } => {
                let Some(entry) = self.sessions.get_mut(session) else {
                    tracing::debug!(%session, %op, "completion for destroyed session dropped");
                    return;
                };
                let Some(kind) = entry.calls.complete(op) else {
                    tracing::debug!(%session, %op, "stale completion dropped");
                    return;
                };
                match (kind, outcome) {
                    (CallKind::Handshake, SessionOutcome::Handshake(result)) => {
                        self.on_handshake(session, result)
                    }
                    (CallKind::AgentRequest(transfer), SessionOutcome::AgentReply(reply)) => {
                        self.on_agent_reply(session, transfer, reply)
                    }
                    (CallKind::OwnerWatch, SessionOutcome::OwnerVanished) => {
                        tracing::info!(%session, "owner left the bus");
                        if let Err(e) = self.shutdown(session) {
                            tracing::debug!(%session, error = %e, "owner shutdown skipped");
                        }
                    }
                    (kind, outcome) => {
                        tracing::warn!(%session, ?kind, ?outcome, "mismatched completion dropped")
                    }
                }
            }
        }
    }

    /// Handle one incoming item. Returns false once both channels are closed.
    pub async fn step(&mut self) -> bool {
        match self.next_event().await {
            Some(incoming) => {
                self.handle(incoming);
                true
            }
            None => false,
        }
    }

    /// Drive the loop until `stop` resolves, then tear every session down.
    pub async fn run<F>(&mut self, stop: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        loop {
            tokio::select! {
                _ = &mut stop => break,
                more = self.step() => if !more { break },
            }
        }
        let destroyed = self.shutdown_all();
        tracing::info!(destroyed, "client stopped");
    }

    fn handle_transport(&mut self, transport: &str, event: TransportEvent) {
        let Some(connector) = self.transports.get_mut(transport) else {
            tracing::warn!(transport, "event for unknown transport dropped");
            return;
        };
        if let Some(result) = connector.handle(event, &self.events) {
            self.on_link(transport, result);
        }
    }

    /// The connector finished an attempt: hand the stream to OBEX or fail.
    fn on_link(&mut self, transport: &str, result: TransportResult) {
        let Some(id) = self.sessions.find_by_attempt(transport, result.attempt) else {
            tracing::debug!(attempt = %result.attempt, "link for abandoned attempt dropped");
            return;
        };
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        session.attempt = None;

        match result.result {
            Ok(stream) => {
                tracing::debug!(session = %id, channel = stream.channel(), "starting OBEX connect");
                let obex = self.obex.clone();
                let target = session.driver.target().map(<[u8]>::to_vec);
                spawn_session_call(
                    &mut session.calls,
                    CallKind::Handshake,
                    &self.events,
                    id,
                    async move {
                        SessionOutcome::Handshake(obex.connect(stream, target.as_deref()).await)
                    },
                );
            }
            Err(e) => self.fail_connect(id, e),
        }
    }

    fn on_handshake(&mut self, id: SessionId, result: Result<ObexLink, ObexError>) {
        match result {
            Ok(link) => {
                let Some(session) = self.sessions.get_mut(id) else {
                    return;
                };
                session.link = Some(link);
                session.state = SessionState::Connected;
                session.resolve_waiters(Ok(()));
                self.sessions.promote(id);
                tracing::info!(session = %id, link = link.id(), "session connected");
            }
            Err(e) => self.fail_connect(id, ObcError::handshake_failed(e.to_string())),
        }
    }

    /// Report a failed connect to every waiter. The session stays allocated
    /// until its holders release it, but is no longer reachable by lookup.
    fn fail_connect(&mut self, id: SessionId, error: ObcError) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        tracing::warn!(session = %id, error = %error, "session connect failed");
        session.state = SessionState::Unbound;
        session.resolve_waiters(Err(error));
        self.sessions.forget(id);
    }
}

fn unknown_session(id: SessionId) -> ObcError {
    ObcError::invalid_arguments(format!("Unknown session: {id}"))
}

/// Watch `owner` on the bus, replacing any earlier watch.
fn watch_owner<U: BusAdapter>(
    bus: &U,
    events: &EventSender,
    session: &mut Session,
    owner: BusName,
) {
    session.calls.cancel_kind(CallKind::OwnerWatch);
    let bus = bus.clone();
    let watched = owner.clone();
    spawn_session_call(
        &mut session.calls,
        CallKind::OwnerWatch,
        events,
        session.id,
        async move {
            bus.wait_for_disconnect(&watched).await;
            SessionOutcome::OwnerVanished
        },
    );
    tracing::debug!(session = %session.id, %owner, "watching owner");
    session.watched = Some(owner);
}

fn spawn_session_call<F>(
    calls: &mut PendingCalls,
    kind: CallKind,
    events: &EventSender,
    session: SessionId,
    call: F,
) where
    F: Future<Output = SessionOutcome> + Send + 'static,
{
    let events = events.clone();
    calls.track(kind, move |op| {
        tokio::spawn(async move {
            let outcome = call.await;
            events.send(Event::Session {
                session,
                op,
                outcome,
            });
        })
    });
}

#[cfg(test)]
#[path = "../client_tests/mod.rs"]
mod tests;
