// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::driver::OPP;
use obc_core::ServiceName;
use std::sync::Arc;

fn key(channel: u8) -> SessionKey {
    SessionKey {
        source: None,
        destination: "00:11:22:33:44:55".parse().unwrap(),
        service: ServiceName::new("OPP"),
        channel,
        owner: None,
    }
}

fn add(registry: &mut SessionRegistry, channel: u8) -> SessionId {
    let id = registry.next_session_id();
    registry.insert(Session::new(
        id,
        key(channel),
        "Bluetooth".to_string(),
        Arc::new(OPP),
    ));
    id
}

#[test]
fn ids_are_sequential_from_one() {
    let mut registry = SessionRegistry::new();
    assert_eq!(registry.next_session_id().get(), 1);
    assert_eq!(registry.next_session_id().get(), 2);
    assert_eq!(registry.next_transfer_id().get(), 1);
}

#[test]
fn path_indices_start_at_zero() {
    let mut registry = SessionRegistry::new();
    assert_eq!(registry.next_path_index(), 0);
    assert_eq!(registry.next_path_index(), 1);
}

#[test]
fn connecting_sessions_are_not_generally_visible() {
    let mut registry = SessionRegistry::new();
    let id = add(&mut registry, 9);
    registry.add_connecting(id);

    assert_eq!(registry.find_connecting(&key(9)), Some(id));
    assert_eq!(registry.find_connecting(&key(0)), None);
    assert_eq!(registry.find_connected(&key(0)), None);
    assert!(!registry.is_reusable(id));
}

#[test]
fn promoted_sessions_serve_loose_queries() {
    let mut registry = SessionRegistry::new();
    let id = add(&mut registry, 9);
    registry.add_connecting(id);
    registry.promote(id);

    assert_eq!(registry.find_connected(&key(0)), Some(id));
    assert_eq!(registry.find_connected(&key(9)), Some(id));
    assert_eq!(registry.find_connected(&key(4)), None);
    assert_eq!(registry.find_connecting(&key(9)), None);
}

#[test]
fn newest_connected_match_wins() {
    let mut registry = SessionRegistry::new();
    let first = add(&mut registry, 9);
    let second = add(&mut registry, 9);
    registry.promote(first);
    registry.promote(second);

    assert_eq!(registry.find_connected(&key(0)), Some(second));
}

#[test]
fn forget_keeps_the_arena_entry() {
    let mut registry = SessionRegistry::new();
    let id = add(&mut registry, 9);
    registry.promote(id);
    registry.forget(id);

    assert!(registry.contains(id));
    assert_eq!(registry.find_connected(&key(9)), None);

    assert!(registry.remove(id).is_some());
    assert!(registry.is_empty());
    assert!(registry.remove(id).is_none());
}

#[test]
fn attempt_lookup_is_scoped_to_transport() {
    let mut registry = SessionRegistry::new();
    let id = add(&mut registry, 0);
    registry.add_connecting(id);
    if let Some(session) = registry.get_mut(id) {
        session.attempt = Some(AttemptId::from(3));
    }

    assert_eq!(
        registry.find_by_attempt("Bluetooth", AttemptId::from(3)),
        Some(id)
    );
    assert_eq!(registry.find_by_attempt("Bluetooth", AttemptId::from(4)), None);
    assert_eq!(registry.find_by_attempt("Loopback", AttemptId::from(3)), None);
}
