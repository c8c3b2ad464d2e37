// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use std::path::PathBuf;

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.trim().is_empty())
}

/// Transport name override (`OBC_TRANSPORT`).
pub fn transport() -> Option<String> {
    non_empty("OBC_TRANSPORT")
}

/// Queue advance rule override (`OBC_QUEUE_ADVANCE`), unparsed.
pub fn queue_advance() -> Option<String> {
    non_empty("OBC_QUEUE_ADVANCE")
}

/// Log filter override (`OBC_LOG`).
pub fn log_filter() -> Option<String> {
    non_empty("OBC_LOG")
}

/// Log file override (`OBC_LOG_PATH`).
pub fn log_path() -> Option<PathBuf> {
    non_empty("OBC_LOG_PATH").map(PathBuf::from)
}
