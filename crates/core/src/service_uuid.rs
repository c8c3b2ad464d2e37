// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service class UUID helpers

use crate::error::ObcError;
use ::uuid::Uuid;

/// Protocol UUID for RFCOMM in its 16-bit short form.
pub const RFCOMM_UUID16: u16 = 0x0003;

/// Bluetooth base UUID `00000000-0000-1000-8000-00805F9B34FB`.
const BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

/// Expand a 16- or 32-bit short UUID onto the Bluetooth base UUID.
pub fn uuid16(short: u32) -> Uuid {
    Uuid::from_u128(BASE_UUID | (u128::from(short) << 96))
}

/// Parse a service UUID string in the canonical hyphenated 128-bit form.
///
/// Braced, URN and unhyphenated forms are rejected. A malformed string means
/// discovery cannot be set up, so it is reported as `ServiceNotFound`.
pub fn parse_service_uuid(s: &str) -> Result<Uuid, ObcError> {
    let hyphenated = s.len() == 36
        && s.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        });
    if !hyphenated {
        return Err(ObcError::service_not_found());
    }
    Uuid::parse_str(s).map_err(|_| ObcError::service_not_found())
}

#[cfg(test)]
#[path = "service_uuid_tests.rs"]
mod tests;
