// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clients wired to the no-op bus and agent, and to kernel sockets

use super::*;
use obc_adapters::{NoOpAgentAdapter, NoOpBusAdapter, RfcommSocketAdapter, SocketAdapter};

type HeadlessClient = Client<FakeObexAdapter, NoOpAgentAdapter, NoOpBusAdapter>;

fn headless<K: SocketAdapter>(sockets: K) -> (HeadlessClient, FakeObexAdapter) {
    let obex = FakeObexAdapter::new();
    let mut transports = TransportRegistry::new();
    transports.register(BluetoothConnector::new(
        TracedBluez::new(FakeBluezAdapter::new()),
        TracedSockets::new(sockets),
    ));
    let client = Client::new(
        ClientDeps {
            obex: obex.clone(),
            agents: NoOpAgentAdapter::new(),
            bus: NoOpBusAdapter::new(),
        },
        ClientConfig::default(),
        transports,
        DriverRegistry::with_defaults(),
    );
    (client, obex)
}

async fn settle(client: &mut HeadlessClient) {
    loop {
        let next = tokio::time::timeout(Duration::from_millis(50), client.next_event()).await;
        match next {
            Ok(Some(incoming)) => client.handle(incoming),
            _ => return,
        }
    }
}

#[tokio::test]
async fn noop_agent_lets_transfers_run() {
    let (mut client, obex) = headless(FakeSocketAdapter::new());
    let Connecting { session, mut ready } = client.find_or_create(opp().channel(9)).unwrap();
    settle(&mut client).await;
    assert_eq!(ready.try_recv().unwrap(), Ok(()));

    let path = client.register(session).unwrap();
    assert_eq!(path, "/org/openobex/session0");
    client.assign_agent(session, ":1.7", "/agent").unwrap();

    let id = client.get(session, GetRequest::default(), None).unwrap();
    assert_eq!(
        client.session(session).unwrap().head().map(|t| t.state),
        Some(TransferState::Authorizing)
    );
    settle(&mut client).await;

    assert_eq!(
        client.session(session).unwrap().head().map(|t| t.state),
        Some(TransferState::Active)
    );
    assert!(obex.complete(id));
    settle(&mut client).await;
    assert!(client.session(session).unwrap().head().is_none());
}

#[tokio::test]
async fn kernel_sockets_without_discovery_report_missing_record() {
    let (mut client, _obex) = headless(RfcommSocketAdapter::new());
    let Connecting { session, mut ready } = client.find_or_create(opp()).unwrap();
    settle(&mut client).await;

    let err = ready.try_recv().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceNotFound);
    assert_eq!(
        client.session(session).map(Session::state),
        Some(SessionState::Unbound)
    );
}
