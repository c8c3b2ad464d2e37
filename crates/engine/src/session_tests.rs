// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::driver::OPP;

const DEST: &str = "00:11:22:33:44:55";
const SRC: &str = "AA:BB:CC:DD:EE:FF";

fn key(source: Option<&str>, channel: u8, owner: Option<&str>) -> SessionKey {
    SessionKey {
        source: source.map(|s| s.parse().unwrap()),
        destination: DEST.parse().unwrap(),
        service: ServiceName::new("OPP"),
        channel,
        owner: owner.map(BusName::new),
    }
}

#[yare::parameterized(
    identical = { key(Some(SRC), 9, None), key(Some(SRC), 9, None), true },
    query_without_source = { key(Some(SRC), 9, None), key(None, 9, None), true },
    query_without_channel = { key(Some(SRC), 9, None), key(Some(SRC), 0, None), true },
    other_source = { key(Some(SRC), 9, None), key(Some("01:02:03:04:05:06"), 9, None), false },
    sourceless_session = { key(None, 9, None), key(Some(SRC), 9, None), false },
    other_channel = { key(None, 9, None), key(None, 4, None), false },
    owner_equal = { key(None, 0, Some(":1.7")), key(None, 0, Some(":1.7")), true },
    owner_missing = { key(None, 0, Some(":1.7")), key(None, 0, None), false },
    owner_extra = { key(None, 0, None), key(None, 0, Some(":1.7")), false },
)]
fn key_matching(session: SessionKey, query: SessionKey, expected: bool) {
    assert_eq!(session.matches(&query), expected);
}

#[test]
fn key_matching_requires_service_and_destination() {
    let session = key(None, 0, None);
    let mut other_service = key(None, 0, None);
    other_service.service = ServiceName::new("FTP");
    assert!(!session.matches(&other_service));

    let mut other_dest = key(None, 0, None);
    other_dest.destination = SRC.parse().unwrap();
    assert!(!session.matches(&other_dest));
}

#[test]
fn new_session_is_unbound_with_one_ref() {
    let session = Session::new(
        SessionId::from(1),
        key(None, 0, None),
        "Bluetooth".to_string(),
        Arc::new(OPP),
    );
    assert_eq!(session.state(), SessionState::Unbound);
    assert_eq!(session.refs(), 1);
    assert!(!session.is_connected());
    assert!(session.head().is_none());
}

#[test]
fn properties_serialize_with_bus_names() {
    let session = Session::new(
        SessionId::from(1),
        key(Some(SRC), 9, None),
        "Bluetooth".to_string(),
        Arc::new(OPP),
    );
    let json = serde_json::to_value(session.properties()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "Source": SRC,
            "Destination": DEST,
            "Channel": 9,
        })
    );
}

#[test]
fn properties_omit_missing_source() {
    let session = Session::new(
        SessionId::from(1),
        key(None, 0, None),
        "Bluetooth".to_string(),
        Arc::new(OPP),
    );
    let json = serde_json::to_value(session.properties()).unwrap();
    assert!(json.get("Source").is_none());
    assert_eq!(json["Channel"], 0);
}

#[tokio::test]
async fn waiters_all_receive_the_result() {
    let mut session = Session::new(
        SessionId::from(1),
        key(None, 0, None),
        "Bluetooth".to_string(),
        Arc::new(OPP),
    );
    let (tx1, rx1) = oneshot::channel();
    let (tx2, rx2) = oneshot::channel();
    session.waiters.push(tx1);
    session.waiters.push(tx2);

    session.resolve_waiters(Err(ObcError::no_adapter()));

    assert_eq!(rx1.await.unwrap(), Err(ObcError::no_adapter()));
    assert_eq!(rx2.await.unwrap(), Err(ObcError::no_adapter()));
    assert!(session.waiters.is_empty());
}
