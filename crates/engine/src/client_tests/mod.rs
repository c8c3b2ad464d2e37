// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client tests

mod agent;
mod connect;
mod headless;
mod teardown;
mod transfers;

use super::*;
use crate::config::QueueAdvance;
use crate::session::{TransferReport, TransferState, TransferStatus};
use crate::transport::BluetoothConnector;
use obc_adapters::{
    AgentCall, FakeAgentAdapter, FakeBluezAdapter, FakeBusAdapter, FakeObexAdapter,
    FakeSocketAdapter, SearchResponse, TracedBluez, TracedSockets, SDP_SVC_SEARCH_ATTR_RSP,
};
use obc_core::{ErrorKind, TransferId};
use std::time::Duration;

type TestClient = Client<FakeObexAdapter, FakeAgentAdapter, FakeBusAdapter>;

const DEST: &str = "00:11:22:33:44:55";

/// Test context holding the client and every fake behind it
struct TestContext {
    client: TestClient,
    bluez: FakeBluezAdapter,
    sockets: FakeSocketAdapter,
    obex: FakeObexAdapter,
    agents: FakeAgentAdapter,
    bus: FakeBusAdapter,
}

fn setup() -> TestContext {
    setup_with(ClientConfig::default(), DriverRegistry::with_defaults())
}

fn setup_with(config: ClientConfig, drivers: DriverRegistry) -> TestContext {
    let bluez = FakeBluezAdapter::new();
    let sockets = FakeSocketAdapter::new();
    let obex = FakeObexAdapter::new();
    let agents = FakeAgentAdapter::new();
    let bus = FakeBusAdapter::new();

    let mut transports = TransportRegistry::new();
    transports.register(BluetoothConnector::new(
        TracedBluez::new(bluez.clone()),
        TracedSockets::new(sockets.clone()),
    ));
    let client = Client::new(
        ClientDeps {
            obex: obex.clone(),
            agents: agents.clone(),
            bus: bus.clone(),
        },
        config,
        transports,
        drivers,
    );

    TestContext {
        client,
        bluez,
        sockets,
        obex,
        agents,
        bus,
    }
}

/// OPP on an unknown channel
fn opp() -> SessionRequest {
    SessionRequest::new(DEST.parse().unwrap(), "OPP")
}

/// One record whose protocol list is L2CAP then RFCOMM(channel)
fn record_list(channel: u8) -> Vec<u8> {
    let protocols = [
        vec![0x35, 0x0c],
        vec![0x35, 0x03, 0x19, 0x01, 0x00],
        vec![0x35, 0x05, 0x19, 0x00, 0x03, 0x08, channel],
    ]
    .concat();
    let record = [vec![0x35, 0x11, 0x09, 0x00, 0x04], protocols].concat();
    [vec![0x35, record.len() as u8], record].concat()
}

fn drain(rx: &mut mpsc::UnboundedReceiver<TransferReport>) -> Vec<TransferStatus> {
    let mut statuses = Vec::new();
    while let Ok(report) = rx.try_recv() {
        statuses.push(report.status);
    }
    statuses
}

impl TestContext {
    /// Handle events until nothing arrives for a while
    async fn settle(&mut self) {
        loop {
            let next =
                tokio::time::timeout(Duration::from_millis(50), self.client.next_event()).await;
            match next {
                Ok(Some(incoming)) => self.client.handle(incoming),
                _ => return,
            }
        }
    }

    /// Create a session and drive it to connected
    async fn connected(&mut self, request: SessionRequest) -> SessionId {
        let Connecting { session, mut ready } = self.client.find_or_create(request).unwrap();
        self.settle().await;
        assert_eq!(ready.try_recv().unwrap(), Ok(()));
        session
    }

    fn set_record_channel(&self, channel: u8) {
        self.sockets.set_search_response(SearchResponse {
            pdu: SDP_SVC_SEARCH_ATTR_RSP,
            status: 0,
            records: record_list(channel),
        });
    }

    fn state(&self, session: SessionId) -> SessionState {
        self.client.session(session).unwrap().state()
    }

    fn refs(&self, session: SessionId) -> u32 {
        self.client.session(session).unwrap().refs()
    }

    fn transfer_states(&self, session: SessionId) -> Vec<(TransferId, TransferState)> {
        self.client
            .session(session)
            .unwrap()
            .transfers()
            .map(|t| (t.id, t.state))
            .collect()
    }

    fn started_ids(&self) -> Vec<TransferId> {
        self.obex.started().into_iter().map(|(id, _)| id).collect()
    }
}
