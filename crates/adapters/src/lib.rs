// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the OBEX client's external collaborators

pub mod agent;
pub mod bluez;
pub mod bus;
pub mod obex;
pub mod socket;
pub mod traced;

#[cfg(any(test, feature = "test-support"))]
mod hold;

pub use agent::{AgentAdapter, AgentBinding, AgentError, NoOpAgentAdapter};
#[cfg(feature = "bluetoothd")]
pub use bluez::SystemBluezAdapter;
pub use bluez::{BluezAdapter, BluezError};
pub use bus::{BusAdapter, BusError, NoOpBusAdapter, SESSION_INTERFACE};
pub use obex::{
    Direction, ObexAdapter, ObexError, ObexLink, ProgressEvent, ProgressSink, ProgressUpdate,
    TransferKind, TransferPayload, TransferRegistration, TransferRequest,
};
pub use socket::{
    AttributeRange, BtStream, DiscoveryHandle, RfcommRequest, RfcommSocketAdapter,
    SearchResponse, SecurityLevel, SocketAdapter, SocketError, StreamIo,
    SDP_SVC_SEARCH_ATTR_RSP,
};
pub use traced::{TracedBluez, TracedSockets};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use agent::{AgentCall, FakeAgentAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use bluez::{BluezCall, FakeBluezAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use bus::{BusCall, FakeBusAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use obex::{FakeObexAdapter, ObexCall};
#[cfg(any(test, feature = "test-support"))]
pub use socket::{FakeSocketAdapter, SocketCall};
