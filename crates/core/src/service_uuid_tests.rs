// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::ErrorKind;

#[test]
fn parses_canonical_opp_uuid() {
    let uuid = parse_service_uuid("00001105-0000-1000-8000-00805f9b34fb").unwrap();
    assert_eq!(uuid, uuid16(0x1105));
}

#[test]
fn parse_is_case_insensitive() {
    let upper = parse_service_uuid("00001106-0000-1000-8000-00805F9B34FB").unwrap();
    assert_eq!(upper, uuid16(0x1106));
}

#[yare::parameterized(
    empty = { "" },
    short_name = { "OPP" },
    simple = { "0000110500001000800000805f9b34fb" },
    braced = { "{00001105-0000-1000-8000-00805f9b34fb}" },
    urn = { "urn:uuid:00001105-0000-1000-8000-00805f9b34fb" },
    misplaced_hyphen = { "0000110-50000-1000-8000-00805f9b34fb" },
    non_hex = { "0000110z-0000-1000-8000-00805f9b34fb" },
)]
fn rejects_non_canonical(input: &str) {
    let err = parse_service_uuid(input).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceNotFound);
}

#[test]
fn uuid16_expands_onto_base() {
    assert_eq!(
        uuid16(u32::from(RFCOMM_UUID16)).to_string(),
        "00000003-0000-1000-8000-00805f9b34fb"
    );
}
