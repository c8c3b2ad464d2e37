// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake adapter manager for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{BluezAdapter, BluezError};
use crate::hold::HeldCalls;
use async_trait::async_trait;
use obc_core::{BdAddr, ObjectPath};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Recorded adapter manager call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BluezCall {
    DefaultAdapter,
    FindAdapter { source: BdAddr },
    RequestSession { adapter: ObjectPath },
    ReleaseSession { adapter: ObjectPath },
}

struct FakeBluezState {
    default_adapter: Option<ObjectPath>,
    adapters: HashMap<BdAddr, ObjectPath>,
    session_error: Option<BluezError>,
    hold_lookups: bool,
    hold_sessions: bool,
    calls: Vec<BluezCall>,
}

/// Fake adapter manager. The default adapter is `/org/bluez/hci0`.
#[derive(Clone)]
pub struct FakeBluezAdapter {
    inner: Arc<Mutex<FakeBluezState>>,
    held: HeldCalls,
}

impl Default for FakeBluezAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeBluezState {
                default_adapter: ObjectPath::parse("/org/bluez/hci0").ok(),
                adapters: HashMap::new(),
                session_error: None,
                hold_lookups: false,
                hold_sessions: false,
                calls: Vec::new(),
            })),
            held: HeldCalls::default(),
        }
    }
}

impl FakeBluezAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<BluezCall> {
        self.inner.lock().calls.clone()
    }

    /// Adapters whose reservation was released, in order
    pub fn released(&self) -> Vec<ObjectPath> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BluezCall::ReleaseSession { adapter } => Some(adapter.clone()),
                _ => None,
            })
            .collect()
    }

    /// Replace (or remove) the default adapter
    pub fn set_default_adapter(&self, adapter: Option<ObjectPath>) {
        self.inner.lock().default_adapter = adapter;
    }

    /// Register an adapter reachable through `find_adapter`
    pub fn add_adapter(&self, address: BdAddr, adapter: ObjectPath) {
        self.inner.lock().adapters.insert(address, adapter);
    }

    /// Make `request_session` fail
    pub fn set_session_error(&self, error: BluezError) {
        self.inner.lock().session_error = Some(error);
    }

    /// Suspend adapter lookups until cancelled
    pub fn hold_lookups(&self, hold: bool) {
        self.inner.lock().hold_lookups = hold;
    }

    /// Suspend session requests until cancelled
    pub fn hold_sessions(&self, hold: bool) {
        self.inner.lock().hold_sessions = hold;
    }

    /// Number of calls currently suspended
    pub fn held_calls(&self) -> usize {
        self.held.count()
    }
}

#[async_trait]
impl BluezAdapter for FakeBluezAdapter {
    async fn default_adapter(&self) -> Result<ObjectPath, BluezError> {
        let (hold, result) = {
            let mut inner = self.inner.lock();
            inner.calls.push(BluezCall::DefaultAdapter);
            let result = inner.default_adapter.clone().ok_or(BluezError::Rejected {
                name: "org.bluez.Error.NoSuchAdapter".to_string(),
                message: "No such adapter".to_string(),
            });
            (inner.hold_lookups, result)
        };
        if hold {
            return self.held.park().await;
        }
        result
    }

    async fn find_adapter(&self, source: &BdAddr) -> Result<ObjectPath, BluezError> {
        let (hold, result) = {
            let mut inner = self.inner.lock();
            inner.calls.push(BluezCall::FindAdapter { source: *source });
            let result = inner
                .adapters
                .get(source)
                .cloned()
                .ok_or(BluezError::Rejected {
                    name: "org.bluez.Error.NoSuchAdapter".to_string(),
                    message: "No such adapter".to_string(),
                });
            (inner.hold_lookups, result)
        };
        if hold {
            return self.held.park().await;
        }
        result
    }

    async fn request_session(&self, adapter: &ObjectPath) -> Result<(), BluezError> {
        let (hold, error) = {
            let mut inner = self.inner.lock();
            inner.calls.push(BluezCall::RequestSession {
                adapter: adapter.clone(),
            });
            (inner.hold_sessions, inner.session_error.clone())
        };
        if hold {
            return self.held.park().await;
        }
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn release_session(&self, adapter: &ObjectPath) {
        self.inner.lock().calls.push(BluezCall::ReleaseSession {
            adapter: adapter.clone(),
        });
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
