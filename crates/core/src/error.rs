// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy surfaced to session callers

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Stable, machine-readable failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    NoAdapter,
    SessionReservationFailed,
    ServiceNotFound,
    ConnectFailed,
    HandshakeFailed,
    NotConnected,
    AlreadyBusy,
    NotAuthorized,
    InvalidArguments,
    Cancelled,
    AlreadyExists,
    TransferFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoAdapter => "NoAdapter",
            ErrorKind::SessionReservationFailed => "SessionReservationFailed",
            ErrorKind::ServiceNotFound => "ServiceNotFound",
            ErrorKind::ConnectFailed => "ConnectFailed",
            ErrorKind::HandshakeFailed => "HandshakeFailed",
            ErrorKind::NotConnected => "NotConnected",
            ErrorKind::AlreadyBusy => "AlreadyBusy",
            ErrorKind::NotAuthorized => "NotAuthorized",
            ErrorKind::InvalidArguments => "InvalidArguments",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::AlreadyExists => "AlreadyExists",
            ErrorKind::TransferFailed => "TransferFailed",
        }
    }

    /// Error name used on the IPC surface, e.g. `org.openobex.Error.NotAuthorized`.
    pub fn bus_name(&self) -> String {
        format!("org.openobex.Error.{}", self.as_str())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure that reaches a caller: a kind plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ObcError {
    kind: ErrorKind,
    message: String,
}

impl ObcError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn no_adapter() -> Self {
        Self::new(ErrorKind::NoAdapter, "No adapter found")
    }

    pub fn reservation_failed() -> Self {
        Self::new(ErrorKind::SessionReservationFailed, "Unable to request session")
    }

    pub fn service_not_found() -> Self {
        Self::new(ErrorKind::ServiceNotFound, "Unable to find service record")
    }

    pub fn connect_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectFailed, message)
    }

    pub fn handshake_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HandshakeFailed, message)
    }

    pub fn not_connected() -> Self {
        Self::new(ErrorKind::NotConnected, "Transport not connected")
    }

    pub fn already_busy() -> Self {
        Self::new(ErrorKind::AlreadyBusy, "Transfer already in progress")
    }

    pub fn not_authorized() -> Self {
        Self::new(ErrorKind::NotAuthorized, "Not Authorized")
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArguments, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    pub fn already_exists() -> Self {
        Self::new(ErrorKind::AlreadyExists, "Already exists")
    }

    pub fn transfer_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransferFailed, message)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
