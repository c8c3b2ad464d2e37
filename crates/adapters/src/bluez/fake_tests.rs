// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn default_adapter_is_hci0() {
    let bluez = FakeBluezAdapter::new();
    let path = bluez.default_adapter().await.unwrap();
    assert_eq!(path, "/org/bluez/hci0");
    assert_eq!(bluez.calls(), vec![BluezCall::DefaultAdapter]);
}

#[tokio::test]
async fn find_adapter_requires_registration() {
    let bluez = FakeBluezAdapter::new();
    let addr: BdAddr = "00:1A:7D:DA:71:13".parse().unwrap();

    assert!(bluez.find_adapter(&addr).await.is_err());

    bluez.add_adapter(addr, ObjectPath::parse("/org/bluez/hci1").unwrap());
    assert_eq!(bluez.find_adapter(&addr).await.unwrap(), "/org/bluez/hci1");
}

#[tokio::test]
async fn session_error_is_returned() {
    let bluez = FakeBluezAdapter::new();
    bluez.set_session_error(BluezError::Bus("timeout".to_string()));
    let adapter = ObjectPath::parse("/org/bluez/hci0").unwrap();
    let err = bluez.request_session(&adapter).await.unwrap_err();
    assert_eq!(err, BluezError::Bus("timeout".to_string()));
}

#[tokio::test]
async fn held_session_counts_until_cancelled() {
    let bluez = FakeBluezAdapter::new();
    bluez.hold_sessions(true);
    let adapter = ObjectPath::parse("/org/bluez/hci0").unwrap();

    let task = {
        let bluez = bluez.clone();
        tokio::spawn(async move { bluez.request_session(&adapter).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(bluez.held_calls(), 1);

    task.abort();
    let _ = task.await;
    assert_eq!(bluez.held_calls(), 0);
}

#[test]
fn release_is_recorded() {
    let bluez = FakeBluezAdapter::new();
    let adapter = ObjectPath::parse("/org/bluez/hci0").unwrap();
    bluez.release_session(&adapter);
    assert_eq!(bluez.released(), vec![adapter]);
}
