// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::driver::FTP;
use obc_adapters::{ObexCall, ObexError};

#[tokio::test]
async fn discovered_channel_links_and_session_becomes_reusable() {
    let mut ctx = setup();
    ctx.set_record_channel(9);

    let session = ctx.connected(opp()).await;

    let requests = ctx.sockets.rfcomm_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].channel, 9);
    assert_eq!(
        ctx.obex.calls(),
        vec![ObexCall::Connect {
            channel: 9,
            target: None
        }]
    );
    assert_eq!(ctx.state(session), SessionState::Connected);
    assert!(ctx.client.sessions().is_reusable(session));
    // Handoff released the adapter reservation
    assert_eq!(ctx.bluez.released().len(), 1);

    let Connecting {
        session: again,
        mut ready,
    } = ctx.client.find_or_create(opp()).unwrap();
    assert_eq!(again, session);
    assert_eq!(ready.try_recv().unwrap(), Ok(()));
    assert_eq!(ctx.refs(session), 2);
    assert_eq!(ctx.sockets.rfcomm_requests().len(), 1);
}

#[tokio::test]
async fn identical_requests_share_an_in_flight_connect() {
    let mut ctx = setup();

    let first = ctx.client.find_or_create(opp().channel(9)).unwrap();
    let second = ctx.client.find_or_create(opp().channel(9)).unwrap();
    let other = ctx.client.find_or_create(opp().channel(4)).unwrap();

    assert_eq!(first.session, second.session);
    assert_ne!(first.session, other.session);
    assert_eq!(ctx.refs(first.session), 2);

    ctx.settle().await;

    for mut ready in [first.ready, second.ready, other.ready] {
        assert_eq!(ready.try_recv().unwrap(), Ok(()));
    }
    let channels: Vec<u8> = ctx
        .sockets
        .rfcomm_requests()
        .iter()
        .map(|r| r.channel)
        .collect();
    assert_eq!(channels.len(), 2);
    assert!(channels.contains(&9) && channels.contains(&4));
}

#[tokio::test]
async fn connecting_session_is_not_found_by_looser_request() {
    let mut ctx = setup();
    ctx.bluez.hold_sessions(true);

    let exact = ctx.client.find_or_create(opp().channel(9)).unwrap();
    let loose = ctx.client.find_or_create(opp()).unwrap();

    assert_ne!(exact.session, loose.session);
    assert_eq!(ctx.state(exact.session), SessionState::Connecting);
}

#[tokio::test]
async fn connected_session_matches_on_source_only_when_asked() {
    let mut ctx = setup();
    let source: obc_core::BdAddr = "AA:BB:CC:DD:EE:FF".parse().unwrap();
    ctx.bluez
        .add_adapter(source, obc_core::ObjectPath::parse("/org/bluez/hci1").unwrap());

    let session = ctx.connected(opp().source(source).channel(9)).await;

    let hit = ctx.client.find_or_create(opp()).unwrap();
    assert_eq!(hit.session, session);

    let miss = ctx
        .client
        .find_or_create(opp().source("01:02:03:04:05:06".parse().unwrap()))
        .unwrap();
    assert_ne!(miss.session, session);
}

#[tokio::test]
async fn owner_is_part_of_identity() {
    let mut ctx = setup();
    let owned = ctx.connected(opp().channel(9).owner(":1.5")).await;

    let unowned = ctx.client.find_or_create(opp().channel(9)).unwrap();
    assert_ne!(unowned.session, owned);

    let same = ctx.client.find_or_create(opp().owner(":1.5")).unwrap();
    assert_eq!(same.session, owned);
    assert_eq!(ctx.client.owner(owned), Some(BusName::new(":1.5")));
}

#[tokio::test]
async fn unknown_service_fails_creation() {
    let mut ctx = setup();

    let err = ctx
        .client
        .find_or_create(SessionRequest::new(DEST.parse().unwrap(), "BIP"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    assert!(ctx.client.sessions().is_empty());
    assert!(ctx.bluez.calls().is_empty());
}

#[tokio::test]
async fn unknown_transport_fails_creation() {
    let config = ClientConfig {
        transport: "Loopback".to_string(),
        ..ClientConfig::default()
    };
    let mut ctx = setup_with(config, DriverRegistry::with_defaults());

    let err = ctx.client.find_or_create(opp()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    assert!(ctx.client.sessions().is_empty());
}

#[yare::parameterized(
    short_destination = { None, "00:11:22" },
    bad_source = { Some("zz:11:22:33:44:55"), DEST },
    dashed = { None, "00-11-22-33-44-55" },
)]
fn request_parse_rejects_malformed_addresses(source: Option<&str>, destination: &str) {
    let err = SessionRequest::parse(source, destination, "OPP", 0, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);
}

#[test]
fn request_parse_accepts_string_forms() {
    let request =
        SessionRequest::parse(Some("AA:BB:CC:DD:EE:FF"), DEST, "FTP", 7, Some(":1.42")).unwrap();
    assert_eq!(request.destination.to_string(), DEST);
    assert_eq!(request.service, "FTP");
    assert_eq!(request.channel, 7);
    assert_eq!(request.owner, Some(BusName::new(":1.42")));
    assert!(request.source.is_some());
}

#[tokio::test]
async fn connect_failure_reaches_every_waiter() {
    let mut ctx = setup();
    ctx.bluez.set_default_adapter(None);

    let first = ctx.client.find_or_create(opp().channel(9)).unwrap();
    let second = ctx.client.find_or_create(opp().channel(9)).unwrap();
    ctx.settle().await;

    for mut ready in [first.ready, second.ready] {
        let err = ready.try_recv().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoAdapter);
        assert_eq!(err.message(), "No adapter found");
    }
    assert_eq!(ctx.state(first.session), SessionState::Unbound);

    // A failed session is not reused
    let retry = ctx.client.find_or_create(opp().channel(9)).unwrap();
    assert_ne!(retry.session, first.session);
}

#[tokio::test]
async fn missing_service_record_fails_connect() {
    let mut ctx = setup();

    let Connecting { session, mut ready } = ctx.client.find_or_create(opp()).unwrap();
    ctx.settle().await;

    let err = ready.try_recv().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceNotFound);
    assert!(ctx.sockets.rfcomm_requests().is_empty());
    assert_eq!(ctx.bluez.released().len(), 1);
    assert!(!ctx.client.session(session).unwrap().is_connected());
}

#[tokio::test]
async fn handshake_rejection_is_a_handshake_failure() {
    let mut ctx = setup();
    ctx.obex.set_connect_error(ObexError::Response(0xc3));

    let Connecting { session, mut ready } = ctx.client.find_or_create(opp().channel(9)).unwrap();
    ctx.settle().await;

    let err = ready.try_recv().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HandshakeFailed);
    assert_eq!(err.message(), "OBEX Connect failed with 0xc3");
    assert!(!ctx.client.sessions().is_reusable(session));
    assert_eq!(ctx.obex.disconnects(), 0);
}

#[tokio::test]
async fn driver_target_is_sent_with_the_handshake() {
    let mut ctx = setup();

    ctx.connected(SessionRequest::new(DEST.parse().unwrap(), "FTP").channel(10))
        .await;

    assert_eq!(
        ctx.obex.calls(),
        vec![ObexCall::Connect {
            channel: 10,
            target: FTP.target.map(<[u8]>::to_vec),
        }]
    );
}

#[tokio::test]
async fn requested_channel_is_kept_after_discovery() {
    let mut ctx = setup();
    ctx.set_record_channel(12);

    let session = ctx.connected(opp()).await;

    assert_eq!(ctx.client.properties(session).unwrap().channel, 0);
    assert_eq!(ctx.sockets.rfcomm_requests()[0].channel, 12);
}
