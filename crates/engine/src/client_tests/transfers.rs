// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use obc_adapters::{Direction, ObexCall, ObexError, ProgressEvent, ProgressUpdate, TransferKind};

fn get() -> GetRequest {
    GetRequest::default()
}

#[tokio::test]
async fn transfers_run_in_order_and_chain() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;

    let t1 = ctx.client.get(session, get(), None).unwrap();
    let t2 = ctx.client.get(session, get(), None).unwrap();
    let t3 = ctx.client.get(session, get(), None).unwrap();

    assert_eq!(ctx.started_ids(), vec![t1]);
    assert_eq!(
        ctx.transfer_states(session),
        vec![
            (t1, TransferState::Active),
            (t2, TransferState::Queued),
            (t3, TransferState::Queued),
        ]
    );

    assert!(ctx.obex.complete(t1));
    ctx.settle().await;

    assert_eq!(ctx.started_ids(), vec![t1, t2]);
    assert_eq!(
        ctx.transfer_states(session),
        vec![(t2, TransferState::Active), (t3, TransferState::Queued)]
    );
    assert_eq!(ctx.obex.unregistered(), vec![t1]);

    assert!(ctx.obex.complete(t2));
    ctx.settle().await;
    assert!(ctx.obex.complete(t3));
    ctx.settle().await;

    assert_eq!(ctx.started_ids(), vec![t1, t2, t3]);
    assert!(ctx.transfer_states(session).is_empty());
}

#[tokio::test]
async fn put_needs_an_empty_queue() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;

    ctx.client.get(session, get(), None).unwrap();

    let err = ctx
        .client
        .put(
            session,
            PutRequest {
                buffer: b"BEGIN:VCARD".to_vec(),
                target: Some("card.vcf".to_string()),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyBusy);
    assert_eq!(err.message(), "Transfer already in progress");

    let pulled = ctx.client.pull(session, PullRequest::default(), None);
    assert!(pulled.is_ok());
    assert_eq!(ctx.transfer_states(session).len(), 2);
}

#[tokio::test]
async fn put_on_idle_session_starts_as_put() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;

    let id = ctx
        .client
        .put(
            session,
            PutRequest {
                buffer: vec![1, 2, 3],
                target: None,
            },
        )
        .unwrap();

    assert_eq!(ctx.obex.started(), vec![(id, Direction::Put)]);
}

#[tokio::test]
async fn send_queues_behind_running_transfer() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;

    let first = ctx.client.get(session, get(), None).unwrap();
    let sent = ctx
        .client
        .send(
            session,
            SendRequest {
                file: "/tmp/photo.jpg".into(),
                target: None,
            },
        )
        .unwrap();

    assert_eq!(ctx.started_ids(), vec![first]);
    assert_eq!(
        ctx.transfer_states(session)[1],
        (sent, TransferState::Queued)
    );
}

#[tokio::test]
async fn enqueue_needs_a_live_link() {
    let mut ctx = setup();
    ctx.bluez.hold_sessions(true);
    let Connecting { session, .. } = ctx.client.find_or_create(opp().channel(9)).unwrap();
    ctx.settle().await;

    let err = ctx.client.get(session, get(), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConnected);

    let err = ctx.client.get(SessionId::from(99), get(), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);
}

#[tokio::test]
async fn request_fields_reach_the_obex_layer() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;

    ctx.client
        .get(
            session,
            GetRequest {
                mime_type: Some("x-obex/folder-listing".to_string()),
                name: Some("/tmp/listing.xml".to_string()),
                target: Some("inbox".to_string()),
                params: Some(vec![0x01, 0x02]),
            },
            None,
        )
        .unwrap();

    let request = ctx
        .obex
        .calls()
        .into_iter()
        .find_map(|c| match c {
            ObexCall::Register(request) => Some(request),
            _ => None,
        })
        .unwrap();
    assert_eq!(request.kind, TransferKind::Get);
    assert_eq!(request.mime_type.as_deref(), Some("x-obex/folder-listing"));
    assert_eq!(request.target.as_deref(), Some("inbox"));
    assert_eq!(request.params, Some(vec![0x01, 0x02]));
    assert_eq!(
        request.payload,
        obc_adapters::TransferPayload::File("/tmp/listing.xml".into())
    );
    assert!(request.agent.is_none());
}

/// Start T1 and T2 without a notifier, finish T1, and report how T2 started
async fn second_transfer_direction(rule: QueueAdvance, finish_with_error: bool) -> Direction {
    let config = ClientConfig {
        queue_advance: rule,
        ..ClientConfig::default()
    };
    let mut ctx = setup_with(config, DriverRegistry::with_defaults());
    let session = ctx.connected(opp().channel(9)).await;

    let t1 = ctx.client.get(session, get(), None).unwrap();
    let t2 = ctx.client.get(session, get(), None).unwrap();
    assert_eq!(ctx.obex.started(), vec![(t1, Direction::Get)]);

    if finish_with_error {
        assert!(ctx.obex.emit_error(t1, "link lost"));
    } else {
        assert!(ctx.obex.complete(t1));
    }
    ctx.settle().await;

    let started = ctx.obex.started();
    assert_eq!(started.len(), 2);
    assert_eq!(started[1].0, t2);
    started[1].1
}

#[tokio::test]
async fn legacy_advance_restarts_queue_as_put_after_error() {
    assert_eq!(
        second_transfer_direction(QueueAdvance::Legacy, true).await,
        Direction::Put
    );
}

#[tokio::test]
async fn legacy_advance_restarts_queue_as_put_after_completion() {
    assert_eq!(
        second_transfer_direction(QueueAdvance::Legacy, false).await,
        Direction::Put
    );
}

#[tokio::test]
async fn by_direction_advance_keeps_own_direction() {
    assert_eq!(
        second_transfer_direction(QueueAdvance::ByDirection, true).await,
        Direction::Get
    );
}

#[tokio::test]
async fn notifier_sees_progress_then_completion() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let id = ctx.client.get(session, get(), Some(tx)).unwrap();
    assert!(ctx.obex.emit_progress(id, 40));
    ctx.settle().await;
    assert!(ctx.obex.complete(id));
    ctx.settle().await;

    assert_eq!(
        drain(&mut rx),
        vec![
            TransferStatus::Progress {
                transferred: 40,
                size: 100
            },
            TransferStatus::Progress {
                transferred: 100,
                size: 100
            },
            TransferStatus::Complete,
        ]
    );
    assert_eq!(ctx.obex.unregistered(), vec![id]);
}

#[tokio::test]
async fn notifier_queue_advances_in_own_direction() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;
    let (tx, _rx) = mpsc::unbounded_channel();

    let t1 = ctx.client.get(session, get(), Some(tx)).unwrap();
    let t2 = ctx.client.pull(session, PullRequest::default(), None).unwrap();
    assert!(ctx.obex.complete(t1));
    ctx.settle().await;

    assert_eq!(
        ctx.obex.started(),
        vec![(t1, Direction::Get), (t2, Direction::Get)]
    );
}

#[tokio::test]
async fn mid_transfer_error_is_reported_and_queue_advances() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let t1 = ctx.client.get(session, get(), Some(tx)).unwrap();
    let t2 = ctx.client.get(session, get(), None).unwrap();
    assert!(ctx.obex.emit_error(t1, "link lost"));
    ctx.settle().await;

    let statuses = drain(&mut rx);
    let Some(TransferStatus::Failed(err)) = statuses.last() else {
        panic!("expected a failure report, got {statuses:?}");
    };
    assert_eq!(err.kind(), ErrorKind::TransferFailed);
    assert_eq!(err.message(), "link lost");
    assert_eq!(ctx.obex.unregistered(), vec![t1]);
    assert_eq!(ctx.started_ids(), vec![t1, t2]);
}

#[tokio::test]
async fn start_failure_finishes_the_transfer() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    ctx.obex
        .set_start_error(Some(ObexError::Transfer("busy".to_string())));

    let id = ctx.client.get(session, get(), Some(tx)).unwrap();

    assert!(ctx.transfer_states(session).is_empty());
    assert_eq!(ctx.obex.unregistered(), vec![id]);
    assert_eq!(ctx.refs(session), 1);
    let statuses = drain(&mut rx);
    assert!(matches!(
        statuses.as_slice(),
        [TransferStatus::Failed(e)] if e.kind() == ErrorKind::TransferFailed
    ));
}

#[tokio::test]
async fn start_failure_moves_on_to_the_next_entry() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;

    let t1 = ctx.client.get(session, get(), None).unwrap();
    let t2 = ctx.client.get(session, get(), None).unwrap();
    let t3 = ctx.client.get(session, get(), None).unwrap();

    // T2 fails to start, so T3 starts straight after
    ctx.obex
        .set_start_error(Some(ObexError::Transfer("busy".to_string())));
    assert!(ctx.obex.complete(t1));
    ctx.settle().await;

    assert_eq!(ctx.obex.unregistered(), vec![t1, t2, t3]);
    assert!(ctx.transfer_states(session).is_empty());
    assert_eq!(ctx.refs(session), 1);
}

#[tokio::test]
async fn registration_failure_leaves_queue_untouched() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;
    ctx.obex
        .set_register_error(ObexError::Transfer("no such file".to_string()));

    let err = ctx
        .client
        .send(
            session,
            SendRequest {
                file: "/missing".into(),
                target: None,
            },
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransferFailed);
    assert_eq!(ctx.refs(session), 1);
    assert!(ctx.transfer_states(session).is_empty());
}

#[tokio::test]
async fn progress_for_a_waiting_transfer_is_ignored() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;

    let t1 = ctx.client.get(session, get(), None).unwrap();
    let t2 = ctx.client.get(session, get(), None).unwrap();

    ctx.client.handle(Incoming::Progress(ProgressUpdate {
        session,
        transfer: t2,
        event: ProgressEvent::Progress {
            transferred: 100,
            size: 100,
        },
    }));

    assert_eq!(
        ctx.transfer_states(session),
        vec![(t1, TransferState::Active), (t2, TransferState::Queued)]
    );
    assert!(ctx.obex.unregistered().is_empty());
}

#[tokio::test]
async fn each_queued_transfer_holds_a_reference() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;

    let t1 = ctx.client.get(session, get(), None).unwrap();
    let t2 = ctx.client.get(session, get(), None).unwrap();
    assert_eq!(ctx.refs(session), 3);

    assert!(ctx.obex.complete(t1));
    ctx.settle().await;
    assert!(ctx.obex.complete(t2));
    ctx.settle().await;
    assert_eq!(ctx.refs(session), 1);

    assert!(ctx.client.session_unref(session));
    assert!(ctx.client.session(session).is_none());
    assert_eq!(ctx.obex.disconnects(), 1);

    // A second release finds nothing to destroy
    assert!(!ctx.client.session_unref(session));
    assert_eq!(ctx.obex.disconnects(), 1);
}

#[tokio::test]
async fn last_transfer_release_destroys_an_abandoned_session() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;

    let t1 = ctx.client.get(session, get(), None).unwrap();
    assert!(!ctx.client.session_unref(session));
    assert!(ctx.client.session(session).is_some());

    assert!(ctx.obex.complete(t1));
    ctx.settle().await;

    assert!(ctx.client.session(session).is_none());
    assert_eq!(ctx.obex.disconnects(), 1);
    assert!(!ctx.client.sessions().is_reusable(session));
}

#[tokio::test]
async fn session_ref_adds_a_holder() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;

    assert_eq!(ctx.client.session_ref(session).unwrap(), 2);
    assert!(!ctx.client.session_unref(session));
    assert!(ctx.client.session_unref(session));
    assert_eq!(
        ctx.client.session_ref(session).unwrap_err().kind(),
        ErrorKind::InvalidArguments
    );
}
