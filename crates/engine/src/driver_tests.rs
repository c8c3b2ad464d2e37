// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use obc_core::parse_service_uuid;

#[yare::parameterized(
    opp = { "OPP", 0x1105, false },
    ftp = { "FTP", 0x1106, true },
    pbap = { "PBAP", 0x112f, true },
    sync = { "SYNC", 0x1104, true },
    map = { "MAP", 0x1132, true },
)]
fn defaults_resolve_by_service(service: &str, short: u32, has_target: bool) {
    let registry = DriverRegistry::with_defaults();
    let driver = registry.find(service).unwrap();
    assert_eq!(driver.service(), service);
    assert_eq!(
        parse_service_uuid(driver.uuid()).unwrap(),
        obc_core::uuid16(short)
    );
    assert_eq!(driver.target().is_some(), has_target);
}

#[test]
fn unknown_service_is_absent() {
    assert!(DriverRegistry::with_defaults().find("BIP").is_none());
    assert!(DriverRegistry::new().find("OPP").is_none());
}

#[test]
fn sync_target_is_ascii() {
    assert_eq!(SYNC.target, Some(&b"IRMC-SYNC"[..]));
}

struct Custom;

impl Driver for Custom {
    fn service(&self) -> &str {
        "OPP"
    }

    fn uuid(&self) -> &str {
        "00001105-0000-1000-8000-00805f9b34fb"
    }

    fn target(&self) -> Option<&[u8]> {
        Some(b"custom")
    }
}

#[test]
fn registering_replaces_by_name() {
    let mut registry = DriverRegistry::with_defaults();
    registry.register(Custom);
    assert_eq!(
        registry.find("OPP").unwrap().target(),
        Some(&b"custom"[..])
    );
}
