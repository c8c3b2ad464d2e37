// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn configured_filter_is_used_without_rust_log() {
    std::env::remove_var("RUST_LOG");
    assert!(build_filter("obc_engine=debug,info").is_ok());
}

#[test]
#[serial]
fn bad_filter_is_reported() {
    std::env::remove_var("RUST_LOG");
    let err = build_filter("obc_engine=loud").unwrap_err();
    assert!(matches!(err, LoggingError::Filter { .. }), "{err}");
}

#[test]
#[serial]
fn rust_log_takes_precedence() {
    std::env::set_var("RUST_LOG", "warn");
    let result = build_filter("obc_engine=loud");
    std::env::remove_var("RUST_LOG");
    assert!(result.is_ok());
}

#[test]
#[serial]
fn path_without_file_name_is_rejected() {
    std::env::remove_var("RUST_LOG");
    let config = LogConfig {
        filter: "info".to_string(),
        path: Some(std::path::PathBuf::from("/")),
    };
    let err = init(&config).unwrap_err();
    assert!(matches!(err, LoggingError::NoFileName(_)), "{err}");
}
