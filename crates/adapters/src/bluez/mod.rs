// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local Bluetooth adapter manager

#[cfg(feature = "bluetoothd")]
mod system;
#[cfg(feature = "bluetoothd")]
pub use system::SystemBluezAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{BluezCall, FakeBluezAdapter};

use async_trait::async_trait;
use obc_core::{BdAddr, ObjectPath};
use thiserror::Error;

/// Errors from the adapter manager
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BluezError {
    #[error("manager replied with an error: {name}, {message}")]
    Rejected { name: String, message: String },
    #[error("bus communication failed: {0}")]
    Bus(String),
}

/// Adapter for the system-level Bluetooth adapter manager.
#[async_trait]
pub trait BluezAdapter: Clone + Send + Sync + 'static {
    /// Resolve the object path of the default local adapter
    async fn default_adapter(&self) -> Result<ObjectPath, BluezError>;

    /// Resolve the object path of the local adapter with the given address
    async fn find_adapter(&self, source: &BdAddr) -> Result<ObjectPath, BluezError>;

    /// Reserve the adapter for a connection
    async fn request_session(&self, adapter: &ObjectPath) -> Result<(), BluezError>;

    /// Release a reservation. Fire-and-forget: failures are only logged.
    fn release_session(&self, adapter: &ObjectPath);
}
