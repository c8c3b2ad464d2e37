// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-service drivers, selected by service name

use obc_core::{ObcError, ObjectPath, SessionId};
use std::collections::HashMap;
use std::sync::Arc;

/// Capabilities of one OBEX service.
pub trait Driver: Send + Sync {
    /// Service name callers select the driver by
    fn service(&self) -> &str;

    /// Service class UUID in canonical 128-bit form
    fn uuid(&self) -> &str;

    /// OBEX target header sent during connect
    fn target(&self) -> Option<&[u8]>;

    /// Called once a session is exported. An error rolls the export back.
    fn probe(&self, _session: SessionId, _path: &ObjectPath) -> Result<(), ObcError> {
        Ok(())
    }

    /// Called when an exported session is withdrawn
    fn remove(&self, _session: SessionId, _path: &ObjectPath) {}
}

/// A driver that is only a static descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDriver {
    pub service: &'static str,
    pub uuid: &'static str,
    pub target: Option<&'static [u8]>,
}

impl Driver for ServiceDriver {
    fn service(&self) -> &str {
        self.service
    }

    fn uuid(&self) -> &str {
        self.uuid
    }

    fn target(&self) -> Option<&[u8]> {
        self.target
    }
}

const FTP_TARGET: [u8; 16] = [
    0xF9, 0xEC, 0x7B, 0xC4, 0x95, 0x3C, 0x11, 0xD2, 0x98, 0x4E, 0x52, 0x54, 0x00, 0xDC, 0x9E,
    0x09,
];

const PBAP_TARGET: [u8; 16] = [
    0x79, 0x61, 0x35, 0xF0, 0xF0, 0xC5, 0x11, 0xD8, 0x09, 0x66, 0x08, 0x00, 0x20, 0x0C, 0x9A,
    0x66,
];

const MAP_TARGET: [u8; 16] = [
    0xBB, 0x58, 0x2B, 0x40, 0x42, 0x0C, 0x11, 0xDB, 0xB0, 0xDE, 0x08, 0x00, 0x20, 0x0C, 0x9A,
    0x66,
];

const SYNC_TARGET: &[u8] = b"IRMC-SYNC";

/// Object Push
pub const OPP: ServiceDriver = ServiceDriver {
    service: "OPP",
    uuid: "00001105-0000-1000-8000-00805f9b34fb",
    target: None,
};

/// File Transfer
pub const FTP: ServiceDriver = ServiceDriver {
    service: "FTP",
    uuid: "00001106-0000-1000-8000-00805f9b34fb",
    target: Some(&FTP_TARGET),
};

/// Phonebook Access
pub const PBAP: ServiceDriver = ServiceDriver {
    service: "PBAP",
    uuid: "0000112f-0000-1000-8000-00805f9b34fb",
    target: Some(&PBAP_TARGET),
};

/// IrMC Synchronization
pub const SYNC: ServiceDriver = ServiceDriver {
    service: "SYNC",
    uuid: "00001104-0000-1000-8000-00805f9b34fb",
    target: Some(SYNC_TARGET),
};

/// Message Access
pub const MAP: ServiceDriver = ServiceDriver {
    service: "MAP",
    uuid: "00001132-0000-1000-8000-00805f9b34fb",
    target: Some(&MAP_TARGET),
};

/// Name-keyed table of drivers.
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Driver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the OPP, FTP, PBAP, SYNC and MAP descriptors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for driver in [OPP, FTP, PBAP, SYNC, MAP] {
            registry.register(driver);
        }
        registry
    }

    /// Register a driver, replacing any with the same service name.
    pub fn register(&mut self, driver: impl Driver + 'static) {
        self.drivers
            .insert(driver.service().to_string(), Arc::new(driver));
    }

    pub fn find(&self, service: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(service).cloned()
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
