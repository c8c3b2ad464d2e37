// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

// --- data element builders ---

fn uint8(v: u8) -> Vec<u8> {
    vec![0x08, v]
}

fn uint16(v: u16) -> Vec<u8> {
    let [a, b] = v.to_be_bytes();
    vec![0x09, a, b]
}

fn uuid16_elem(v: u16) -> Vec<u8> {
    let [a, b] = v.to_be_bytes();
    vec![0x19, a, b]
}

fn seq(items: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = items.concat();
    let mut out = vec![0x35, body.len() as u8];
    out.extend(body);
    out
}

fn alt(items: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = items.concat();
    let mut out = vec![0x3d, body.len() as u8];
    out.extend(body);
    out
}

const L2CAP: u16 = 0x0100;
const OBEX: u16 = 0x0008;

/// Protocol descriptor list: L2CAP, RFCOMM(channel), OBEX
fn rfcomm_protocols(channel: u8) -> Vec<u8> {
    seq(&[
        seq(&[uuid16_elem(L2CAP)]),
        seq(&[uuid16_elem(RFCOMM_UUID16), uint8(channel)]),
        seq(&[uuid16_elem(OBEX)]),
    ])
}

/// Attribute list with a service class and the given protocol list
fn record(protocols: Vec<u8>) -> Vec<u8> {
    seq(&[
        uint16(0x0001),
        seq(&[uuid16_elem(0x1105)]),
        uint16(PROTOCOL_DESCRIPTOR_LIST),
        protocols,
    ])
}

fn l2cap_only_record() -> Vec<u8> {
    record(seq(&[seq(&[uuid16_elem(L2CAP), uint16(0x1001)])]))
}

fn response(records: &[Vec<u8>]) -> SearchResponse {
    SearchResponse {
        pdu: SDP_SVC_SEARCH_ATTR_RSP,
        status: 0,
        records: seq(records),
    }
}

// --- channel resolution ---

#[test]
fn single_record_yields_its_channel() {
    let rsp = response(&[record(rfcomm_protocols(9))]);
    assert_eq!(find_rfcomm_channel(&rsp), Some(9));
}

#[test]
fn first_positive_channel_wins_over_later_records() {
    let rsp = response(&[
        l2cap_only_record(),
        record(rfcomm_protocols(9)),
        record(rfcomm_protocols(4)),
    ]);
    assert_eq!(find_rfcomm_channel(&rsp), Some(9));

    let rsp = response(&[record(rfcomm_protocols(3)), record(rfcomm_protocols(9))]);
    assert_eq!(find_rfcomm_channel(&rsp), Some(3));
}

#[test]
fn zero_channel_contributes_nothing() {
    let rsp = response(&[record(rfcomm_protocols(0)), record(rfcomm_protocols(12))]);
    assert_eq!(find_rfcomm_channel(&rsp), Some(12));
}

#[test]
fn malformed_record_body_is_skipped() {
    // Outer length is right, but the inner element claims more bytes than it has
    let broken = vec![0x35, 0x03, 0x0a, 0x00, 0x04];
    let rsp = response(&[broken, record(rfcomm_protocols(7))]);
    assert_eq!(find_rfcomm_channel(&rsp), Some(7));
}

#[test]
fn non_sequence_record_is_skipped() {
    let rsp = response(&[uint16(5), record(rfcomm_protocols(2))]);
    assert_eq!(find_rfcomm_channel(&rsp), Some(2));
}

#[test]
fn bad_record_header_stops_scan() {
    // Type 31 is not a valid data element type
    let rsp = response(&[vec![0xf8], record(rfcomm_protocols(7))]);
    assert_eq!(find_rfcomm_channel(&rsp), None);
}

#[test]
fn truncated_outer_list_yields_nothing() {
    let mut rsp = response(&[record(rfcomm_protocols(9)), l2cap_only_record()]);
    // Claim more bytes than the response carries
    rsp.records[1] += 4;

    assert_eq!(find_rfcomm_channel(&rsp), None);
}

#[test]
fn alternative_protocol_lists_are_searched() {
    let protocols = alt(&[
        seq(&[seq(&[uuid16_elem(L2CAP)])]),
        rfcomm_protocols(15),
    ]);
    let rsp = response(&[record(protocols)]);
    assert_eq!(find_rfcomm_channel(&rsp), Some(15));
}

#[test]
fn full_length_rfcomm_uuid_matches() {
    let mut long_uuid = vec![0x1c];
    long_uuid.extend(uuid16(u32::from(RFCOMM_UUID16)).as_bytes());
    let protocols = seq(&[seq(&[long_uuid, uint8(21)])]);
    let rsp = response(&[record(protocols)]);
    assert_eq!(find_rfcomm_channel(&rsp), Some(21));
}

#[yare::parameterized(
    error_status = { SDP_SVC_SEARCH_ATTR_RSP, 1 },
    wrong_pdu = { 0x03, 0 },
)]
fn rejected_responses_yield_nothing(pdu: u8, status: u16) {
    let mut rsp = response(&[record(rfcomm_protocols(9))]);
    rsp.pdu = pdu;
    rsp.status = status;
    assert_eq!(find_rfcomm_channel(&rsp), None);
}

#[test]
fn empty_and_missing_lists_yield_nothing() {
    assert_eq!(find_rfcomm_channel(&response(&[])), None);
    assert_eq!(find_rfcomm_channel(&response(&[l2cap_only_record()])), None);
    let rsp = SearchResponse {
        pdu: SDP_SVC_SEARCH_ATTR_RSP,
        status: 0,
        records: Vec::new(),
    };
    assert_eq!(find_rfcomm_channel(&rsp), None);
}

// --- element decoding ---

#[yare::parameterized(
    nil = { &[0x00], DataElement::Nil },
    uint8 = { &[0x08, 0x2a], DataElement::Uint(42) },
    uint32 = { &[0x0a, 0x00, 0x01, 0x00, 0x00], DataElement::Uint(65536) },
    sint8 = { &[0x10, 0xff], DataElement::Sint(-1) },
    boolean = { &[0x28, 0x01], DataElement::Bool(true) },
    text = { &[0x25, 0x02, b'h', b'i'], DataElement::Text(b"hi".to_vec()) },
    url = { &[0x45, 0x01, b'x'], DataElement::Url(b"x".to_vec()) },
    empty_seq = { &[0x35, 0x00], DataElement::Sequence(vec![]) },
)]
fn decodes_elements(bytes: &[u8], expected: DataElement) {
    let (element, used) = parse_element(bytes, 0).unwrap();
    assert_eq!(element, expected);
    assert_eq!(used, bytes.len());
}

#[yare::parameterized(
    empty = { &[], SdpError::Truncated },
    short_uint = { &[0x09, 0x01], SdpError::Truncated },
    nil_with_size = { &[0x01], SdpError::InvalidSize { kind: 0, size: 1 } },
    unknown_type = { &[0xf8], SdpError::UnknownType(31) },
    missing_length = { &[0x35], SdpError::Truncated },
)]
fn rejects_malformed_elements(bytes: &[u8], expected: SdpError) {
    assert_eq!(parse_element(bytes, 0).unwrap_err(), expected);
}

#[test]
fn deep_nesting_is_rejected() {
    let mut deep = uint8(1);
    for _ in 0..40 {
        let mut out = vec![0x36];
        out.extend((deep.len() as u16).to_be_bytes());
        out.extend(deep);
        deep = out;
    }
    assert_eq!(parse_element(&deep, 0).unwrap_err(), SdpError::TooDeep);
}

proptest! {
    #[test]
    fn scanning_arbitrary_bytes_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let rsp = SearchResponse { pdu: SDP_SVC_SEARCH_ATTR_RSP, status: 0, records: bytes };
        let _ = find_rfcomm_channel(&rsp);
    }

    #[test]
    fn decoding_arbitrary_bytes_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = parse_element(&bytes, 0);
    }
}
