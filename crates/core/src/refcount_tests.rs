// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn creator_holds_first_reference() {
    let mut refs = RefCount::new();
    assert_eq!(refs.get(), 1);
    assert_eq!(refs.release(), Release::Last);
}

#[test]
fn last_release_reported_exactly_once() {
    let mut refs = RefCount::new();
    assert_eq!(refs.acquire(), 2);
    assert_eq!(refs.acquire(), 3);

    let outcomes: Vec<Release> = (0..5).map(|_| refs.release()).collect();
    assert_eq!(
        outcomes,
        vec![
            Release::Alive(2),
            Release::Alive(1),
            Release::Last,
            Release::Stale,
            Release::Stale,
        ]
    );
    assert_eq!(outcomes.iter().filter(|r| **r == Release::Last).count(), 1);
}
