// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake bus for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{BusAdapter, BusError};
use crate::hold::HeldCalls;
use async_trait::async_trait;
use obc_core::{BusName, ObjectPath};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;

/// Recorded bus call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusCall {
    Register { path: ObjectPath, interface: String },
    Unregister { path: ObjectPath, interface: String },
    Watch { name: BusName },
}

struct FakeBusState {
    registered: HashSet<ObjectPath>,
    register_error: Option<BusError>,
    names: HashMap<BusName, watch::Sender<bool>>,
    calls: Vec<BusCall>,
}

/// Fake bus. Every name stays connected until [`FakeBusAdapter::disconnect_name`].
#[derive(Clone)]
pub struct FakeBusAdapter {
    inner: Arc<Mutex<FakeBusState>>,
    watchers: HeldCalls,
}

impl Default for FakeBusAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeBusState {
                registered: HashSet::new(),
                register_error: None,
                names: HashMap::new(),
                calls: Vec::new(),
            })),
            watchers: HeldCalls::default(),
        }
    }
}

impl FakeBusAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<BusCall> {
        self.inner.lock().calls.clone()
    }

    pub fn is_registered(&self, path: &str) -> bool {
        self.inner.lock().registered.iter().any(|p| p == path)
    }

    pub fn set_register_error(&self, error: Option<BusError>) {
        self.inner.lock().register_error = error;
    }

    /// Simulate `name` leaving the bus
    pub fn disconnect_name(&self, name: &str) {
        let mut inner = self.inner.lock();
        inner
            .names
            .entry(BusName::new(name))
            .or_insert_with(|| watch::channel(false).0)
            .send_replace(true);
    }

    /// Number of liveness watches currently waiting
    pub fn active_watches(&self) -> usize {
        self.watchers.count()
    }
}

#[async_trait]
impl BusAdapter for FakeBusAdapter {
    fn register_object(&self, path: &ObjectPath, interface: &str) -> Result<(), BusError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BusCall::Register {
            path: path.clone(),
            interface: interface.to_string(),
        });
        if let Some(e) = inner.register_error.clone() {
            return Err(e);
        }
        if !inner.registered.insert(path.clone()) {
            return Err(BusError::AlreadyRegistered(path.to_string()));
        }
        Ok(())
    }

    fn unregister_object(&self, path: &ObjectPath, interface: &str) {
        let mut inner = self.inner.lock();
        inner.calls.push(BusCall::Unregister {
            path: path.clone(),
            interface: interface.to_string(),
        });
        inner.registered.remove(path);
    }

    async fn wait_for_disconnect(&self, name: &BusName) {
        let mut rx = {
            let mut inner = self.inner.lock();
            inner.calls.push(BusCall::Watch { name: name.clone() });
            inner
                .names
                .entry(name.clone())
                .or_insert_with(|| watch::channel(false).0)
                .subscribe()
        };
        let _watching = self.watchers.enter();
        loop {
            let gone = *rx.borrow_and_update();
            if gone || rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
