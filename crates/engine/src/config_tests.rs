// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

const VARS: [&str; 4] = ["OBC_TRANSPORT", "OBC_QUEUE_ADVANCE", "OBC_LOG", "OBC_LOG_PATH"];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, ClientConfig::default());
    assert_eq!(config.transport, "Bluetooth");
    assert_eq!(config.session_base_path, "/org/openobex");
    assert_eq!(config.queue_advance, QueueAdvance::Legacy);
    assert_eq!(config.log.filter, "info");
    assert!(config.log.path.is_none());
}

#[test]
fn partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.toml");
    std::fs::write(
        &path,
        "queue_advance = \"by_direction\"\n\n[log]\nfilter = \"debug\"\n",
    )
    .unwrap();

    let config = ClientConfig::load(&path).unwrap();
    assert_eq!(config.queue_advance, QueueAdvance::ByDirection);
    assert_eq!(config.log.filter, "debug");
    assert_eq!(config.transport, "Bluetooth");
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.toml");
    std::fs::write(&path, "queue_advance = \"sideways\"\n").unwrap();

    let err = ClientConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
}

#[yare::parameterized(
    legacy_get = { QueueAdvance::Legacy, Direction::Get, Direction::Put },
    legacy_put = { QueueAdvance::Legacy, Direction::Put, Direction::Put },
    own_get = { QueueAdvance::ByDirection, Direction::Get, Direction::Get },
    own_put = { QueueAdvance::ByDirection, Direction::Put, Direction::Put },
)]
fn advance_direction(rule: QueueAdvance, own: Direction, expected: Direction) {
    assert_eq!(rule.direction(own), expected);
}

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    std::env::set_var("OBC_TRANSPORT", "Loopback");
    std::env::set_var("OBC_QUEUE_ADVANCE", "by_direction");
    std::env::set_var("OBC_LOG", "obc_engine=trace");
    std::env::set_var("OBC_LOG_PATH", "/tmp/obc.log");

    let config = ClientConfig::default().with_env_overrides().unwrap();
    clear_env();

    assert_eq!(config.transport, "Loopback");
    assert_eq!(config.queue_advance, QueueAdvance::ByDirection);
    assert_eq!(config.log.filter, "obc_engine=trace");
    assert_eq!(config.log.path, Some(PathBuf::from("/tmp/obc.log")));
}

#[test]
#[serial]
fn empty_env_values_are_ignored() {
    clear_env();
    std::env::set_var("OBC_TRANSPORT", "  ");

    let config = ClientConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.transport, "Bluetooth");
}

#[test]
#[serial]
fn bad_queue_advance_env_is_rejected() {
    clear_env();
    std::env::set_var("OBC_QUEUE_ADVANCE", "fifo");

    let err = ClientConfig::default().with_env_overrides().unwrap_err();
    clear_env();

    assert!(
        matches!(err, ConfigError::InvalidEnv { var: "OBC_QUEUE_ADVANCE", .. }),
        "{err}"
    );
}
