// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC bus: object export and principal liveness

mod noop;

pub use noop::NoOpBusAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{BusCall, FakeBusAdapter};

use async_trait::async_trait;
use obc_core::{BusName, ObjectPath};
use thiserror::Error;

/// Interface name sessions are exported under.
pub const SESSION_INTERFACE: &str = "org.openobex.Session";

/// Errors from bus operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("object already registered: {0}")]
    AlreadyRegistered(String),
    #[error("bus error: {0}")]
    Failed(String),
}

/// Adapter for the IPC bus.
#[async_trait]
pub trait BusAdapter: Clone + Send + Sync + 'static {
    /// Export an object path with an interface
    fn register_object(&self, path: &ObjectPath, interface: &str) -> Result<(), BusError>;

    fn unregister_object(&self, path: &ObjectPath, interface: &str);

    /// Resolve once `name` leaves the bus
    async fn wait_for_disconnect(&self, name: &BusName);
}
