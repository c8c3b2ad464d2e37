// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op bus adapter for headless use.

use super::{BusAdapter, BusError};
use async_trait::async_trait;
use obc_core::{BusName, ObjectPath};

/// Bus adapter that exports nothing and never sees anyone leave.
///
/// Used when sessions are driven in-process without an IPC surface.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpBusAdapter;

impl NoOpBusAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BusAdapter for NoOpBusAdapter {
    fn register_object(&self, _path: &ObjectPath, _interface: &str) -> Result<(), BusError> {
        Ok(())
    }

    fn unregister_object(&self, _path: &ObjectPath, _interface: &str) {}

    async fn wait_for_disconnect(&self, _name: &BusName) {
        std::future::pending::<()>().await
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
