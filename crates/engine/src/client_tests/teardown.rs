// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use obc_adapters::SocketCall;

#[tokio::test]
async fn owner_departure_tears_the_session_down() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9).owner(":1.5")).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let t1 = ctx.client.get(session, GetRequest::default(), Some(tx)).unwrap();
    let t2 = ctx.client.get(session, GetRequest::default(), None).unwrap();

    ctx.bus.disconnect_name(":1.5");
    ctx.settle().await;

    assert_eq!(ctx.obex.unregistered(), vec![t1, t2]);
    assert!(drain(&mut rx).is_empty());
    assert_eq!(ctx.obex.disconnects(), 1);
    assert_eq!(ctx.state(session), SessionState::ShuttingDown);
    assert_eq!(ctx.refs(session), 1);
    assert!(ctx.transfer_states(session).is_empty());

    // Gone from lookup; a new request builds a new session
    let next = ctx.client.find_or_create(opp().owner(":1.5")).unwrap();
    assert_ne!(next.session, session);
}

#[tokio::test]
async fn shutdown_during_reservation_cancels_the_request() {
    let mut ctx = setup();
    ctx.bluez.hold_sessions(true);
    let Connecting { session, mut ready } = ctx.client.find_or_create(opp()).unwrap();
    ctx.settle().await;
    assert_eq!(ctx.bluez.held_calls(), 1);

    ctx.client.shutdown(session).unwrap();
    ctx.settle().await;

    assert_eq!(ctx.bluez.held_calls(), 0);
    assert!(ctx.bluez.released().is_empty());
    assert_eq!(
        ready.try_recv().unwrap().unwrap_err().kind(),
        ErrorKind::Cancelled
    );
    assert_eq!(ctx.state(session), SessionState::ShuttingDown);
}

#[tokio::test]
async fn shutdown_during_search_closes_discovery_and_releases_once() {
    let mut ctx = setup();
    ctx.sockets.hold_searches(true);
    let Connecting { session, .. } = ctx.client.find_or_create(opp()).unwrap();
    ctx.settle().await;
    assert_eq!(ctx.sockets.held_calls(), 1);

    ctx.client.shutdown(session).unwrap();
    ctx.settle().await;

    assert_eq!(ctx.sockets.held_calls(), 0);
    assert_eq!(ctx.bluez.released().len(), 1);
    assert!(ctx
        .sockets
        .calls()
        .iter()
        .any(|c| matches!(c, SocketCall::CloseDiscovery { .. })));
    assert!(ctx.sockets.rfcomm_requests().is_empty());

    ctx.client.shutdown(session).unwrap();
    assert_eq!(ctx.bluez.released().len(), 1);
}

#[tokio::test]
async fn shutdown_during_handshake_cancels_it() {
    let mut ctx = setup();
    ctx.obex.hold_connects(true);
    let Connecting { session, mut ready } = ctx.client.find_or_create(opp().channel(9)).unwrap();
    ctx.settle().await;
    assert_eq!(ctx.obex.held_calls(), 1);

    ctx.client.shutdown(session).unwrap();
    ctx.settle().await;

    assert_eq!(ctx.obex.held_calls(), 0);
    assert!(!ctx.client.session(session).unwrap().is_connected());
    assert_eq!(
        ready.try_recv().unwrap().unwrap_err().kind(),
        ErrorKind::Cancelled
    );
}

#[tokio::test]
async fn shutdown_during_authorization_cancels_the_agent_request() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;
    ctx.client.assign_agent(session, ":1.9", "/agent").unwrap();
    ctx.agents.hold_requests(true);
    let id = ctx.client.get(session, GetRequest::default(), None).unwrap();
    ctx.settle().await;
    assert_eq!(ctx.agents.held_calls(), 1);

    ctx.client.shutdown(session).unwrap();
    ctx.settle().await;

    assert_eq!(ctx.agents.held_calls(), 0);
    assert!(ctx.obex.started().is_empty());
    assert_eq!(ctx.obex.unregistered(), vec![id]);
    assert_eq!(ctx.refs(session), 1);
}

#[tokio::test]
async fn shutdown_withdraws_the_export_and_is_repeatable() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;
    let path = ctx.client.register(session).unwrap();

    ctx.client.shutdown(session).unwrap();
    ctx.client.shutdown(session).unwrap();

    assert!(!ctx.bus.is_registered(path.as_str()));
    assert!(ctx.client.path(session).is_none());
    assert_eq!(ctx.obex.disconnects(), 1);

    let err = ctx
        .client
        .get(session, GetRequest::default(), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConnected);

    // The caller's own release still destroys exactly once
    assert!(ctx.client.session_unref(session));
    assert_eq!(ctx.obex.disconnects(), 1);
}

#[tokio::test]
async fn late_completions_after_destruction_are_dropped() {
    let mut ctx = setup();
    ctx.obex.hold_connects(true);
    let Connecting { session, .. } = ctx.client.find_or_create(opp().channel(9)).unwrap();
    ctx.settle().await;

    assert!(ctx.client.session_unref(session));
    ctx.client.handle(Incoming::Progress(obc_adapters::ProgressUpdate {
        session,
        transfer: TransferId::from(1),
        event: obc_adapters::ProgressEvent::Failed("late".to_string()),
    }));
    ctx.settle().await;

    assert!(ctx.client.sessions().is_empty());
    assert_eq!(ctx.obex.held_calls(), 0);
    assert!(ctx.obex.unregistered().is_empty());
}

#[tokio::test]
async fn shutdown_all_destroys_every_session() {
    let mut ctx = setup();
    let first = ctx.connected(opp().channel(9)).await;
    ctx.client.session_ref(first).unwrap();
    ctx.connected(opp().channel(4)).await;

    assert_eq!(ctx.client.shutdown_all(), 2);

    assert!(ctx.client.sessions().is_empty());
    assert_eq!(ctx.obex.disconnects(), 2);
}

#[tokio::test]
async fn run_returns_when_stopped() {
    let mut ctx = setup();
    ctx.connected(opp().channel(9)).await;

    ctx.client.run(std::future::ready(())).await;

    assert!(ctx.client.sessions().is_empty());
}

#[tokio::test]
async fn run_drives_connects_until_stopped() {
    let mut ctx = setup();
    let Connecting { mut ready, .. } = ctx.client.find_or_create(opp().channel(9)).unwrap();

    ctx.client
        .run(tokio::time::sleep(Duration::from_millis(100)))
        .await;

    assert_eq!(ready.try_recv().unwrap(), Ok(()));
    assert!(ctx.client.sessions().is_empty());
}
