// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! obc-core: value types shared by the OBEX client crates

pub mod address;
pub mod error;
pub mod id;
pub mod refcount;
pub mod service_uuid;

pub use address::BdAddr;
pub use error::{ErrorKind, ObcError};
pub use id::{AttemptId, BusName, ObjectPath, OpId, Sequence, ServiceName, SessionId, TransferId};
pub use refcount::{RefCount, Release};
pub use service_uuid::{parse_service_uuid, uuid16, RFCOMM_UUID16};
