// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! OBEX client engine: Bluetooth connector, sessions and transfer queue

mod client;
pub mod config;
pub mod driver;
mod env;
mod event;
pub mod logging;
mod pending;
pub mod session;
pub mod transport;

pub use client::{
    Client, ClientDeps, Connecting, GetRequest, Notifier, PullRequest, PutRequest, SendRequest,
    SessionRequest,
};
pub use config::{ClientConfig, ConfigError, LogConfig, QueueAdvance};
pub use driver::{Driver, DriverRegistry, ServiceDriver};
pub use event::{Event, EventSender, Incoming, SessionOutcome};
pub use pending::{CallKind, PendingCalls};
pub use session::{
    Session, SessionKey, SessionProperties, SessionRegistry, SessionState, Transfer,
    TransferReport, TransferState, TransferStatus,
};
pub use transport::{
    BluetoothConnector, ConnectRequest, Transport, TransportEvent, TransportRegistry,
    TransportResult, BLUETOOTH,
};
