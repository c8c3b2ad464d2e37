// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn register_rejects_duplicates() {
    let bus = FakeBusAdapter::new();
    let path = ObjectPath::parse("/org/openobex/session1").unwrap();

    bus.register_object(&path, "org.openobex.Session").unwrap();
    assert!(bus.is_registered("/org/openobex/session1"));
    assert!(matches!(
        bus.register_object(&path, "org.openobex.Session"),
        Err(BusError::AlreadyRegistered(_))
    ));

    bus.unregister_object(&path, "org.openobex.Session");
    assert!(!bus.is_registered("/org/openobex/session1"));
}

#[tokio::test]
async fn watch_resolves_on_disconnect() {
    let bus = FakeBusAdapter::new();
    let task = {
        let bus = bus.clone();
        tokio::spawn(async move { bus.wait_for_disconnect(&BusName::new(":1.7")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(bus.active_watches(), 1);
    assert!(!task.is_finished());

    bus.disconnect_name(":1.7");
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bus.active_watches(), 0);
}

#[tokio::test]
async fn watch_on_departed_name_resolves_immediately() {
    let bus = FakeBusAdapter::new();
    bus.disconnect_name(":1.9");
    tokio::time::timeout(
        Duration::from_secs(1),
        bus.wait_for_disconnect(&BusName::new(":1.9")),
    )
    .await
    .unwrap();
}
