// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service discovery response scanning.
//!
//! A service search attribute response carries a data element sequence
//! with one attribute list per service record. Each attribute list is a
//! sequence of (attribute id, value) pairs.

use obc_adapters::{SearchResponse, SDP_SVC_SEARCH_ATTR_RSP};
use obc_core::{uuid16, RFCOMM_UUID16};
use thiserror::Error;
use uuid::Uuid;

/// Attribute id of the protocol descriptor list.
pub const PROTOCOL_DESCRIPTOR_LIST: u16 = 0x0004;

/// Nesting limit for data elements.
const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdpError {
    #[error("data element truncated")]
    Truncated,
    #[error("invalid size index {size} for type {kind}")]
    InvalidSize { kind: u8, size: u8 },
    #[error("unknown data element type {0}")]
    UnknownType(u8),
    #[error("data elements nested too deeply")]
    TooDeep,
}

/// A decoded data element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataElement {
    Nil,
    Uint(u128),
    Sint(i128),
    Uuid(Uuid),
    Text(Vec<u8>),
    Bool(bool),
    Sequence(Vec<DataElement>),
    Alternative(Vec<DataElement>),
    Url(Vec<u8>),
}

/// Resolve the RFCOMM channel of the first record that yields a positive one.
///
/// Returns `None` when the response reports an error, is not a search
/// attribute response, or no record yields a channel. A record whose body
/// fails to decode contributes nothing; a record header that fails to
/// decode ends the scan.
pub fn find_rfcomm_channel(response: &SearchResponse) -> Option<u8> {
    if response.status != 0 || response.pdu != SDP_SVC_SEARCH_ATTR_RSP {
        tracing::debug!(
            pdu = response.pdu,
            status = response.status,
            "search response rejected"
        );
        return None;
    }

    let (kind, header, len) = parse_header(&response.records).ok()?;
    if kind != 6 {
        return None;
    }
    // A truncated outer list is rejected whole, even if complete records
    // precede the cut
    let body = response.records.get(header..header.checked_add(len)?)?;

    let mut rest = body;
    let mut index = 0usize;
    while !rest.is_empty() {
        let Ok((_, header, len)) = parse_header(rest) else {
            tracing::debug!(record = index, "malformed record header, stopping scan");
            break;
        };
        let Some(end) = header.checked_add(len).filter(|end| *end <= rest.len()) else {
            tracing::debug!(record = index, "record overruns response, stopping scan");
            break;
        };
        let record = &rest[..end];
        rest = &rest[end..];

        match parse_element(record, 0) {
            Ok((DataElement::Sequence(attributes), _)) => {
                if let Some(channel) = record_channel(&attributes) {
                    tracing::debug!(record = index, channel, "rfcomm channel found");
                    return Some(channel);
                }
            }
            Ok(_) => tracing::debug!(record = index, "record is not a sequence, skipped"),
            Err(e) => tracing::debug!(record = index, error = %e, "malformed record, skipped"),
        }
        index += 1;
    }
    None
}

/// RFCOMM channel from one record's attribute list, if positive.
fn record_channel(attributes: &[DataElement]) -> Option<u8> {
    let value = attributes.chunks(2).find_map(|pair| match pair {
        [DataElement::Uint(id), value] if *id == u128::from(PROTOCOL_DESCRIPTOR_LIST) => {
            Some(value)
        }
        _ => None,
    })?;

    match value {
        DataElement::Sequence(protocols) => protocols_channel(protocols),
        // Alternatives: each entry is its own protocol descriptor list
        DataElement::Alternative(lists) => lists.iter().find_map(|list| match list {
            DataElement::Sequence(protocols) => protocols_channel(protocols),
            _ => None,
        }),
        _ => None,
    }
}

fn protocols_channel(protocols: &[DataElement]) -> Option<u8> {
    let rfcomm = uuid16(u32::from(RFCOMM_UUID16));
    protocols.iter().find_map(|descriptor| match descriptor {
        DataElement::Sequence(parts) => match parts.as_slice() {
            [DataElement::Uuid(uuid), DataElement::Uint(channel), ..] if *uuid == rfcomm => {
                u8::try_from(*channel).ok().filter(|ch| *ch > 0)
            }
            _ => None,
        },
        _ => None,
    })
}

/// Decode a header: returns (type, header length, body length).
pub fn parse_header(buf: &[u8]) -> Result<(u8, usize, usize), SdpError> {
    let first = *buf.first().ok_or(SdpError::Truncated)?;
    let kind = first >> 3;
    let size = first & 0x07;

    let fixed = |len: usize| -> Result<(u8, usize, usize), SdpError> { Ok((kind, 1, len)) };
    match (kind, size) {
        (0, 0) => fixed(0),
        (0, _) => Err(SdpError::InvalidSize { kind, size }),
        (1 | 2, 0..=4) => fixed(1 << size),
        (3, 1) => fixed(2),
        (3, 2) => fixed(4),
        (3, 4) => fixed(16),
        (5, 0) => fixed(1),
        (4 | 6 | 7 | 8, 5) => {
            let len = *buf.get(1).ok_or(SdpError::Truncated)?;
            Ok((kind, 2, usize::from(len)))
        }
        (4 | 6 | 7 | 8, 6) => {
            let bytes = buf.get(1..3).ok_or(SdpError::Truncated)?;
            Ok((kind, 3, usize::from(u16::from_be_bytes([bytes[0], bytes[1]]))))
        }
        (4 | 6 | 7 | 8, 7) => {
            let bytes = buf.get(1..5).ok_or(SdpError::Truncated)?;
            let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            let len = usize::try_from(len).map_err(|_| SdpError::Truncated)?;
            Ok((kind, 5, len))
        }
        (0..=8, _) => Err(SdpError::InvalidSize { kind, size }),
        _ => Err(SdpError::UnknownType(kind)),
    }
}

/// Decode one element, returning it and the number of bytes consumed.
pub fn parse_element(buf: &[u8], depth: usize) -> Result<(DataElement, usize), SdpError> {
    if depth > MAX_DEPTH {
        return Err(SdpError::TooDeep);
    }
    let (kind, header, len) = parse_header(buf)?;
    let end = header.checked_add(len).ok_or(SdpError::Truncated)?;
    let body = buf.get(header..end).ok_or(SdpError::Truncated)?;

    let element = match kind {
        0 => DataElement::Nil,
        1 => DataElement::Uint(be_uint(body)),
        2 => DataElement::Sint(be_sint(body)),
        3 => DataElement::Uuid(match body.len() {
            2 | 4 => uuid16(be_uint(body) as u32),
            _ => Uuid::from_u128(be_uint(body)),
        }),
        4 => DataElement::Text(body.to_vec()),
        5 => DataElement::Bool(body.first().is_some_and(|b| *b != 0)),
        6 | 7 => {
            let mut items = Vec::new();
            let mut rest = body;
            while !rest.is_empty() {
                let (item, used) = parse_element(rest, depth + 1)?;
                items.push(item);
                rest = &rest[used..];
            }
            if kind == 6 {
                DataElement::Sequence(items)
            } else {
                DataElement::Alternative(items)
            }
        }
        8 => DataElement::Url(body.to_vec()),
        other => return Err(SdpError::UnknownType(other)),
    };
    Ok((element, end))
}

fn be_uint(bytes: &[u8]) -> u128 {
    bytes
        .iter()
        .fold(0u128, |acc, b| (acc << 8) | u128::from(*b))
}

fn be_sint(bytes: &[u8]) -> i128 {
    let unsigned = be_uint(bytes);
    let bits = bytes.len() * 8;
    if bits == 0 || bits >= 128 {
        return unsigned as i128;
    }
    let shift = 128 - bits;
    ((unsigned << shift) as i128) >> shift
}

#[cfg(test)]
#[path = "sdp_tests.rs"]
mod tests;
