// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::SecurityLevel;

fn addr(s: &str) -> BdAddr {
    s.parse().unwrap()
}

#[tokio::test]
async fn discovery_handles_are_tracked_until_closed() {
    let sockets = FakeSocketAdapter::new();
    let dst = addr("00:11:22:33:44:55");

    let handle = sockets.open_discovery(&BdAddr::ANY, &dst).await.unwrap();
    assert_eq!(sockets.open_discoveries(), 1);

    sockets.close_discovery(handle);
    assert_eq!(sockets.open_discoveries(), 0);

    let err = sockets
        .search_attributes(handle, Uuid::nil(), AttributeRange::FULL)
        .await
        .unwrap_err();
    assert_eq!(err, SocketError::Closed);
}

#[tokio::test]
async fn configured_search_response_is_returned() {
    let sockets = FakeSocketAdapter::new();
    let response = SearchResponse {
        pdu: SDP_SVC_SEARCH_ATTR_RSP,
        status: 0,
        records: vec![0x35, 0x02, 0x35, 0x00],
    };
    sockets.set_search_response(response.clone());

    let handle = sockets
        .open_discovery(&BdAddr::ANY, &addr("00:11:22:33:44:55"))
        .await
        .unwrap();
    let got = sockets
        .search_attributes(handle, Uuid::nil(), AttributeRange::FULL)
        .await
        .unwrap();
    assert_eq!(got, response);
}

#[tokio::test]
async fn rfcomm_connect_records_request() {
    let sockets = FakeSocketAdapter::new();
    let request = RfcommRequest {
        source: BdAddr::ANY,
        destination: addr("00:11:22:33:44:55"),
        channel: 9,
        security: SecurityLevel::Low,
    };

    let stream = sockets.connect_rfcomm(&request).await.unwrap();
    assert_eq!(stream.channel(), 9);
    assert_eq!(stream.peer(), request.destination);
    assert_eq!(sockets.rfcomm_requests(), vec![request]);
}

#[tokio::test]
async fn rfcomm_connect_error() {
    let sockets = FakeSocketAdapter::new();
    sockets.set_connect_error(SocketError::Refused("host down".to_string()));
    let request = RfcommRequest {
        source: BdAddr::ANY,
        destination: addr("00:11:22:33:44:55"),
        channel: 1,
        security: SecurityLevel::Low,
    };
    assert!(sockets.connect_rfcomm(&request).await.is_err());
}
