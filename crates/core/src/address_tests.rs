// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::ErrorKind;
use proptest::prelude::*;

#[test]
fn parses_canonical_form() {
    let addr: BdAddr = "00:11:22:33:44:55".parse().unwrap();
    assert_eq!(addr.octets(), [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
}

#[test]
fn accepts_lowercase_and_displays_uppercase() {
    let addr: BdAddr = "aa:bb:cc:dd:ee:0f".parse().unwrap();
    assert_eq!(addr.to_string(), "AA:BB:CC:DD:EE:0F");
}

#[test]
fn any_is_all_zero() {
    assert!(BdAddr::ANY.is_any());
    assert_eq!(BdAddr::ANY.to_string(), "00:00:00:00:00:00");
    assert!(!BdAddr::new([0, 0, 0, 0, 0, 1]).is_any());
}

#[yare::parameterized(
    empty = { "" },
    too_short = { "00:11:22:33:44" },
    too_long = { "00:11:22:33:44:55:66" },
    single_digit = { "0:11:22:33:44:55" },
    three_digits = { "000:11:22:33:44:55" },
    not_hex = { "0g:11:22:33:44:55" },
    dashes = { "00-11-22-33-44-55" },
    trailing_colon = { "00:11:22:33:44:55:" },
    signed = { "+0:11:22:33:44:55" },
)]
fn rejects_malformed(input: &str) {
    let err = input.parse::<BdAddr>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);
}

#[test]
fn serde_uses_string_form() {
    let addr: BdAddr = "00:11:22:33:44:55".parse().unwrap();
    let json = serde_json::to_string(&addr).unwrap();
    assert_eq!(json, "\"00:11:22:33:44:55\"");
    let back: BdAddr = serde_json::from_str(&json).unwrap();
    assert_eq!(back, addr);
    assert!(serde_json::from_str::<BdAddr>("\"nope\"").is_err());
}

proptest! {
    #[test]
    fn parse_never_panics(s in "\\PC*") {
        let _ = s.parse::<BdAddr>();
    }

    #[test]
    fn display_parses_back(octets in any::<[u8; 6]>()) {
        let addr = BdAddr::new(octets);
        prop_assert_eq!(addr.to_string().parse::<BdAddr>().unwrap(), addr);
    }
}
