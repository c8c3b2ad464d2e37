// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bus::SESSION_INTERFACE;
use std::time::Duration;

#[test]
fn noop_bus_accepts_every_export() {
    let bus = NoOpBusAdapter::new();
    let path = ObjectPath::parse("/org/openobex/session0").unwrap();

    assert!(bus.register_object(&path, SESSION_INTERFACE).is_ok());
    assert!(bus.register_object(&path, SESSION_INTERFACE).is_ok());
    bus.unregister_object(&path, SESSION_INTERFACE);
}

#[tokio::test]
async fn noop_bus_never_reports_a_disconnect() {
    let bus = NoOpBusAdapter::new();
    let name = BusName::new(":1.42");

    let waited =
        tokio::time::timeout(Duration::from_millis(20), bus.wait_for_disconnect(&name)).await;
    assert!(waited.is_err());
}
