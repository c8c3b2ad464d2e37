// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BlueZ adapter manager over the system bus

use super::{BluezAdapter, BluezError};
use async_trait::async_trait;
use bluer::{Adapter, Address, Session};
use obc_core::{BdAddr, ObjectPath};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const ADAPTER_PREFIX: &str = "/org/bluez/";

/// Adapter manager backed by `bluetoothd`.
///
/// A reservation powers the adapter on if needed. The adapter is powered
/// back off when the last reservation that found it off is released.
#[derive(Clone)]
pub struct SystemBluezAdapter {
    session: Session,
    reservations: Arc<Mutex<Reservations>>,
}

impl SystemBluezAdapter {
    /// Connect to `bluetoothd`
    pub async fn new() -> Result<Self, BluezError> {
        let session = Session::new().await.map_err(bluer_error)?;
        Ok(Self {
            session,
            reservations: Arc::new(Mutex::new(Reservations::default())),
        })
    }

    fn adapter(&self, path: &ObjectPath) -> Result<Adapter, BluezError> {
        let name = adapter_name(path).ok_or_else(|| BluezError::Rejected {
            name: "InvalidArguments".to_string(),
            message: format!("not an adapter path: {path}"),
        })?;
        self.session.adapter(name).map_err(bluer_error)
    }
}

#[async_trait]
impl BluezAdapter for SystemBluezAdapter {
    async fn default_adapter(&self) -> Result<ObjectPath, BluezError> {
        let adapter = self.session.default_adapter().await.map_err(bluer_error)?;
        adapter_path(adapter.name())
    }

    async fn find_adapter(&self, source: &BdAddr) -> Result<ObjectPath, BluezError> {
        let wanted = Address::new(source.octets());
        for name in self.session.adapter_names().await.map_err(bluer_error)? {
            let adapter = self.session.adapter(&name).map_err(bluer_error)?;
            match adapter.address().await {
                Ok(address) if address == wanted => return adapter_path(&name),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(adapter = %name, error = %e, "adapter address unreadable")
                }
            }
        }
        Err(BluezError::Rejected {
            name: "NoSuchAdapter".to_string(),
            message: format!("no adapter with address {source}"),
        })
    }

    async fn request_session(&self, adapter: &ObjectPath) -> Result<(), BluezError> {
        let handle = self.adapter(adapter)?;
        let powered = handle.is_powered().await.map_err(bluer_error)?;
        if !powered {
            handle.set_powered(true).await.map_err(bluer_error)?;
            tracing::info!(%adapter, "adapter powered on");
        }
        self.reservations.lock().acquire(adapter, !powered);
        Ok(())
    }

    fn release_session(&self, adapter: &ObjectPath) {
        let Some(power_off) = self.reservations.lock().release(adapter) else {
            tracing::warn!(%adapter, "release without reservation");
            return;
        };
        if !power_off {
            return;
        }
        let handle = match self.adapter(adapter) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(%adapter, error = %e, "adapter gone before release");
                return;
            }
        };
        let adapter = adapter.clone();
        tokio::spawn(async move {
            if let Err(e) = handle.set_powered(false).await {
                tracing::warn!(%adapter, error = %e, "adapter power off failed");
            }
        });
    }
}

/// Outstanding reservations per adapter path.
#[derive(Debug, Default)]
struct Reservations {
    held: HashMap<ObjectPath, Held>,
}

#[derive(Debug)]
struct Held {
    count: usize,
    powered_on: bool,
}

impl Reservations {
    fn acquire(&mut self, adapter: &ObjectPath, powered_on: bool) {
        let held = self.held.entry(adapter.clone()).or_insert(Held {
            count: 0,
            powered_on: false,
        });
        held.count += 1;
        held.powered_on |= powered_on;
    }

    /// `Some(true)` when this was the last reservation and it powered the
    /// adapter on. `None` when nothing was held.
    fn release(&mut self, adapter: &ObjectPath) -> Option<bool> {
        let held = self.held.get_mut(adapter)?;
        held.count -= 1;
        if held.count > 0 {
            return Some(false);
        }
        self.held.remove(adapter).map(|held| held.powered_on)
    }
}

fn adapter_path(name: &str) -> Result<ObjectPath, BluezError> {
    ObjectPath::parse(format!("{ADAPTER_PREFIX}{name}")).map_err(|e| BluezError::Rejected {
        name: "InvalidArguments".to_string(),
        message: e.message().to_string(),
    })
}

fn adapter_name(path: &ObjectPath) -> Option<&str> {
    path.as_str()
        .strip_prefix(ADAPTER_PREFIX)
        .filter(|name| !name.is_empty() && !name.contains('/'))
}

fn bluer_error(e: bluer::Error) -> BluezError {
    BluezError::Rejected {
        name: format!("{:?}", e.kind),
        message: e.message,
    }
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
