// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use obc_adapters::{
    BluezCall, FakeBluezAdapter, FakeSocketAdapter, SocketCall, SDP_SVC_SEARCH_ATTR_RSP,
};
use obc_core::{uuid16, ErrorKind};
use std::time::Duration;
use tokio::sync::mpsc;

const OPP_UUID: &str = "00001105-0000-1000-8000-00805f9b34fb";

struct Harness {
    connector: BluetoothConnector<FakeBluezAdapter, FakeSocketAdapter>,
    bluez: FakeBluezAdapter,
    sockets: FakeSocketAdapter,
    events: EventSender,
    rx: mpsc::UnboundedReceiver<Event>,
}

fn setup() -> Harness {
    let bluez = FakeBluezAdapter::new();
    let sockets = FakeSocketAdapter::new();
    let (tx, rx) = mpsc::unbounded_channel();
    Harness {
        connector: BluetoothConnector::new(bluez.clone(), sockets.clone()),
        bluez,
        sockets,
        events: EventSender::new(tx),
        rx,
    }
}

impl Harness {
    fn connect(&mut self, source: Option<&str>, channel: u8, uuid: &str) -> AttemptId {
        let request = ConnectRequest {
            source: source.map(|s| s.parse().unwrap()),
            destination: "00:11:22:33:44:55".parse().unwrap(),
            service_uuid: uuid.to_string(),
            channel,
        };
        self.connector.connect(request, &self.events).unwrap()
    }

    /// Feed completions until the attempt reports or nothing arrives for a while
    async fn run(&mut self) -> Option<TransportResult> {
        loop {
            match tokio::time::timeout(Duration::from_millis(50), self.rx.recv()).await {
                Ok(Some(Event::Transport { event, .. })) => {
                    if let Some(result) = self.connector.handle(event, &self.events) {
                        return Some(result);
                    }
                }
                Ok(Some(_)) => continue,
                _ => return None,
            }
        }
    }

    fn set_record_channel(&self, channel: u8) {
        self.sockets.set_search_response(SearchResponse {
            pdu: SDP_SVC_SEARCH_ATTR_RSP,
            status: 0,
            records: record_list(channel),
        });
    }
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

fn hci0() -> ObjectPath {
    ObjectPath::parse("/org/bluez/hci0").unwrap()
}

fn unwrap_err(result: TransportResult) -> ErrorKind {
    match result.result {
        Ok(stream) => panic!("expected failure, got {stream:?}"),
        Err(e) => e.kind(),
    }
}

#[tokio::test]
async fn known_channel_links_directly() {
    let mut h = setup();
    let attempt = h.connect(None, 9, OPP_UUID);

    let result = h.run().await.unwrap();
    assert_eq!(result.attempt, attempt);
    assert_eq!(result.result.unwrap().channel(), 9);

    assert_eq!(
        h.bluez.calls(),
        vec![
            BluezCall::DefaultAdapter,
            BluezCall::RequestSession { adapter: hci0() },
            BluezCall::ReleaseSession { adapter: hci0() },
        ]
    );
    let requests = h.sockets.rfcomm_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].source, BdAddr::ANY);
    assert_eq!(requests[0].channel, 9);
    assert_eq!(requests[0].security, SecurityLevel::Low);
    assert!(!h
        .sockets
        .calls()
        .iter()
        .any(|c| matches!(c, SocketCall::OpenDiscovery { .. })));
    assert_eq!(h.connector.active_attempts(), 0);
}

#[tokio::test]
async fn unknown_channel_is_discovered_then_linked() {
    let mut h = setup();
    h.set_record_channel(9);
    h.connect(None, 0, OPP_UUID);

    let stream = h.run().await.unwrap().result.unwrap();
    assert_eq!(stream.channel(), 9);

    let calls = h.sockets.calls();
    assert!(matches!(calls[0], SocketCall::OpenDiscovery { .. }));
    match &calls[1] {
        SocketCall::Search { service, range, .. } => {
            assert_eq!(*service, uuid16(0x1105));
            assert_eq!(*range, AttributeRange::FULL);
        }
        other => panic!("expected search, got {other:?}"),
    }
    assert!(matches!(calls[2], SocketCall::CloseDiscovery { .. }));
    assert_eq!(h.sockets.rfcomm_requests()[0].channel, 9);
    assert_eq!(h.sockets.open_discoveries(), 0);
    assert_eq!(h.bluez.released(), vec![hci0()]);
}

#[tokio::test]
async fn named_source_uses_find_adapter() {
    let mut h = setup();
    let source: BdAddr = "00:1A:7D:DA:71:13".parse().unwrap();
    let hci1 = ObjectPath::parse("/org/bluez/hci1").unwrap();
    h.bluez.add_adapter(source, hci1.clone());
    h.connect(Some("00:1A:7D:DA:71:13"), 3, OPP_UUID);

    assert!(h.run().await.unwrap().result.is_ok());
    assert_eq!(h.bluez.calls()[0], BluezCall::FindAdapter { source });
    assert_eq!(h.sockets.rfcomm_requests()[0].source, source);
    assert_eq!(h.bluez.released(), vec![hci1]);
}

#[tokio::test]
async fn missing_adapter_fails_without_reservation() {
    let mut h = setup();
    h.bluez.set_default_adapter(None);
    h.connect(None, 9, OPP_UUID);

    assert_eq!(unwrap_err(h.run().await.unwrap()), ErrorKind::NoAdapter);
    assert_eq!(h.bluez.calls(), vec![BluezCall::DefaultAdapter]);
    assert_eq!(h.connector.active_attempts(), 0);
}

#[tokio::test]
async fn unknown_source_fails_with_no_adapter() {
    let mut h = setup();
    h.connect(Some("00:1A:7D:DA:71:13"), 9, OPP_UUID);
    assert_eq!(unwrap_err(h.run().await.unwrap()), ErrorKind::NoAdapter);
}

#[tokio::test]
async fn rejected_reservation_is_not_released() {
    let mut h = setup();
    h.bluez.set_session_error(obc_adapters::BluezError::Rejected {
        name: "org.bluez.Error.Failed".to_string(),
        message: "busy".to_string(),
    });
    h.connect(None, 9, OPP_UUID);

    assert_eq!(
        unwrap_err(h.run().await.unwrap()),
        ErrorKind::SessionReservationFailed
    );
    assert!(h.bluez.released().is_empty());
    assert!(h.sockets.calls().is_empty());
}

#[tokio::test]
async fn no_matching_record_fails_and_releases_once() {
    let mut h = setup();
    h.connect(None, 0, OPP_UUID);

    assert_eq!(unwrap_err(h.run().await.unwrap()), ErrorKind::ServiceNotFound);
    assert_eq!(h.bluez.released(), vec![hci0()]);
    assert_eq!(h.sockets.open_discoveries(), 0);
    assert!(h.sockets.rfcomm_requests().is_empty());
}

#[tokio::test]
async fn search_error_fails_with_service_not_found() {
    let mut h = setup();
    h.sockets.set_search_error(SocketError::Io("reset".to_string()));
    h.connect(None, 0, OPP_UUID);

    assert_eq!(unwrap_err(h.run().await.unwrap()), ErrorKind::ServiceNotFound);
    assert_eq!(h.sockets.open_discoveries(), 0);
}

#[yare::parameterized(
    short_name = { "OPP" },
    braced = { "{00001105-0000-1000-8000-00805f9b34fb}" },
    truncated = { "00001105-0000-1000-8000" },
)]
fn malformed_uuid_fails_discovery_setup(uuid: &str) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(async {
        let mut h = setup();
        h.connect(None, 0, uuid);

        assert_eq!(unwrap_err(h.run().await.unwrap()), ErrorKind::ServiceNotFound);
        assert!(h.sockets.calls().is_empty());
        assert_eq!(h.bluez.released(), vec![hci0()]);
    });
}

#[tokio::test]
async fn stream_failure_is_connect_failed() {
    let mut h = setup();
    h.sockets
        .set_connect_error(SocketError::Refused("host is down".to_string()));
    h.connect(None, 4, OPP_UUID);

    let result = h.run().await.unwrap();
    let err = result.result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectFailed);
    assert!(err.message().contains("host is down"));
    assert_eq!(h.bluez.released(), vec![hci0()]);
}

#[tokio::test]
async fn disconnect_during_reservation_cancels_the_call() {
    let mut h = setup();
    h.bluez.hold_sessions(true);
    let attempt = h.connect(None, 9, OPP_UUID);

    assert!(h.run().await.is_none());
    assert_eq!(h.connector.stage(attempt), Some(Stage::Reserving));
    assert_eq!(h.bluez.held_calls(), 1);

    h.connector.disconnect(attempt);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(h.bluez.held_calls(), 0);
    assert_eq!(h.connector.stage(attempt), None);
    assert!(h.bluez.released().is_empty());
    assert!(h.run().await.is_none());
}

#[tokio::test]
async fn disconnect_during_search_closes_and_releases() {
    let mut h = setup();
    h.sockets.hold_searches(true);
    let attempt = h.connect(None, 0, OPP_UUID);

    assert!(h.run().await.is_none());
    assert_eq!(h.connector.stage(attempt), Some(Stage::Searching));
    assert_eq!(h.sockets.open_discoveries(), 1);

    h.connector.disconnect(attempt);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(h.sockets.held_calls(), 0);
    assert_eq!(h.sockets.open_discoveries(), 0);
    assert_eq!(h.bluez.released(), vec![hci0()]);

    // Idempotent
    h.connector.disconnect(attempt);
    assert_eq!(h.bluez.released().len(), 1);
}

#[tokio::test]
async fn disconnect_unknown_attempt_is_ignored() {
    let mut h = setup();
    h.connector.disconnect(AttemptId(42));
    assert!(h.bluez.calls().is_empty());
}

#[tokio::test]
async fn attempts_get_distinct_ids() {
    let mut h = setup();
    let a = h.connect(None, 1, OPP_UUID);
    let b = h.connect(None, 1, OPP_UUID);
    assert_ne!(a, b);
    assert_eq!(h.connector.active_attempts(), 2);
}
