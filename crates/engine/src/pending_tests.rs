// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Spawn a task that reports its op id after `delay_ms`
fn delayed(tx: mpsc::UnboundedSender<OpId>, delay_ms: u64) -> impl FnOnce(OpId) -> JoinHandle<()> {
    move |op| {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            let _ = tx.send(op);
        })
    }
}

#[tokio::test]
async fn completion_removes_call_once() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut calls = PendingCalls::new();
    let op = calls.track(CallKind::AdapterResolve, delayed(tx, 0));
    assert!(calls.contains(op));

    let reported = rx.recv().await.unwrap();
    assert_eq!(reported, op);
    assert_eq!(calls.complete(reported), Some(CallKind::AdapterResolve));
    assert_eq!(calls.complete(reported), None);
    assert!(calls.is_empty());
}

#[tokio::test]
async fn ids_are_unique_per_registry() {
    let mut calls = PendingCalls::new();
    let a = calls.track(CallKind::Handshake, |_| tokio::spawn(async {}));
    let b = calls.track(CallKind::OwnerWatch, |_| tokio::spawn(async {}));
    assert_ne!(a, b);
    assert_eq!(calls.len(), 2);
}

#[tokio::test]
async fn cancelled_call_never_reports() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut calls = PendingCalls::new();
    let op = calls.track(CallKind::DiscoverySearch, delayed(tx, 20));

    assert!(calls.cancel(op));
    assert!(!calls.cancel(op));

    let got = tokio::time::timeout(Duration::from_millis(60), rx.recv()).await;
    assert!(matches!(got, Ok(None)), "task should be aborted and sender dropped");
}

#[tokio::test]
async fn cancel_all_aborts_every_task() {
    let ran = Arc::new(AtomicBool::new(false));
    let mut calls = PendingCalls::new();
    for kind in [CallKind::SessionReserve, CallKind::StreamConnect] {
        let ran = Arc::clone(&ran);
        calls.track(kind, move |_| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                ran.store(true, Ordering::SeqCst);
            })
        });
    }

    assert_eq!(calls.cancel_all(), 2);
    assert!(calls.is_empty());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn drop_aborts_outstanding_calls() {
    let ran = Arc::new(AtomicBool::new(false));
    {
        let mut calls = PendingCalls::new();
        let ran = Arc::clone(&ran);
        calls.track(CallKind::AgentRequest(TransferId(1)), move |_| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                ran.store(true, Ordering::SeqCst);
            })
        });
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn cancel_kind_only_touches_matching_calls() {
    let mut calls = PendingCalls::new();
    let watch = calls.track(CallKind::OwnerWatch, |_| {
        tokio::spawn(std::future::pending::<()>())
    });
    calls.track(CallKind::AgentRequest(TransferId(4)), |_| {
        tokio::spawn(std::future::pending::<()>())
    });

    assert_eq!(calls.cancel_kind(CallKind::AgentRequest(TransferId(4))), 1);
    assert!(calls.contains(watch));
    assert!(calls.has_kind(CallKind::OwnerWatch));
    assert!(!calls.has_kind(CallKind::AgentRequest(TransferId(4))));
}
