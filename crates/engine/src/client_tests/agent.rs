// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::driver::{Driver, OPP};
use obc_adapters::{AgentBinding, AgentError, BusCall, ObexCall, SESSION_INTERFACE};
use obc_core::ObjectPath;
use std::sync::{Arc, Mutex};

const AGENT: &str = ":1.9";
const AGENT_PATH: &str = "/org/example/agent";

fn transfer_path(id: TransferId) -> ObjectPath {
    ObjectPath::parse(format!("/org/openobex/transfer{id}")).unwrap()
}

async fn with_agent(ctx: &mut TestContext) -> SessionId {
    let session = ctx.connected(opp().channel(9)).await;
    ctx.client.assign_agent(session, AGENT, AGENT_PATH).unwrap();
    session
}

#[tokio::test]
async fn agent_authorizes_before_the_transfer_starts() {
    let mut ctx = setup();
    let session = with_agent(&mut ctx).await;

    let id = ctx.client.get(session, GetRequest::default(), None).unwrap();
    assert_eq!(
        ctx.transfer_states(session),
        vec![(id, TransferState::Authorizing)]
    );
    assert!(ctx.obex.started().is_empty());

    ctx.settle().await;

    assert_eq!(ctx.agents.requests(), vec![transfer_path(id)]);
    assert_eq!(ctx.started_ids(), vec![id]);
    assert_eq!(
        ctx.transfer_states(session),
        vec![(id, TransferState::Active)]
    );
}

#[tokio::test]
async fn bound_agent_name_is_passed_to_registration() {
    let mut ctx = setup();
    let session = with_agent(&mut ctx).await;

    ctx.client.get(session, GetRequest::default(), None).unwrap();

    let registered = ctx.obex.calls().into_iter().find_map(|c| match c {
        ObexCall::Register(request) => request.agent,
        _ => None,
    });
    assert_eq!(registered, Some(BusName::new(AGENT)));
}

#[tokio::test]
async fn agent_reply_renames_the_transfer() {
    let mut ctx = setup();
    let session = with_agent(&mut ctx).await;
    ctx.agents.set_reply("holiday.jpg");

    let id = ctx.client.get(session, GetRequest::default(), None).unwrap();
    ctx.settle().await;

    assert!(ctx.obex.calls().contains(&ObexCall::Start {
        transfer: id,
        direction: obc_adapters::Direction::Get,
        name: Some("holiday.jpg".to_string()),
    }));
}

#[tokio::test]
async fn transfers_without_a_path_skip_authorization() {
    let mut ctx = setup();
    let session = with_agent(&mut ctx).await;
    ctx.obex.export_paths(false);

    let id = ctx.client.get(session, GetRequest::default(), None).unwrap();

    assert_eq!(ctx.started_ids(), vec![id]);
    assert!(ctx.agents.requests().is_empty());
}

#[tokio::test]
async fn agent_refusal_fails_the_transfer_without_starting_it() {
    let mut ctx = setup();
    let session = with_agent(&mut ctx).await;
    ctx.agents.set_error(AgentError::Replied {
        name: "org.openobex.Error.Rejected".to_string(),
        message: "Not today".to_string(),
    });
    let (tx, mut rx) = mpsc::unbounded_channel();

    let t1 = ctx.client.get(session, GetRequest::default(), Some(tx)).unwrap();
    ctx.settle().await;

    assert!(ctx.obex.started().is_empty());
    assert_eq!(ctx.obex.unregistered(), vec![t1]);
    let statuses = drain(&mut rx);
    let [TransferStatus::Failed(err)] = statuses.as_slice() else {
        panic!("expected one failure, got {statuses:?}");
    };
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(err.message(), "Not today");
    // The agent is not told about its own refusal
    assert!(!ctx
        .agents
        .calls()
        .iter()
        .any(|c| matches!(c, AgentCall::Error { .. })));
}

#[tokio::test]
async fn agent_follows_progress_and_completion() {
    let mut ctx = setup();
    let session = with_agent(&mut ctx).await;

    let id = ctx.client.get(session, GetRequest::default(), None).unwrap();
    ctx.settle().await;
    assert!(ctx.obex.emit_progress(id, 25));
    ctx.settle().await;
    assert!(ctx.obex.complete(id));
    ctx.settle().await;

    let path = transfer_path(id);
    let notices: Vec<AgentCall> = ctx
        .agents
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, AgentCall::Request { .. }))
        .collect();
    assert_eq!(
        notices,
        vec![
            AgentCall::Progress {
                transfer: path.clone(),
                transferred: 25
            },
            AgentCall::Progress {
                transfer: path.clone(),
                transferred: 100
            },
            AgentCall::Complete { transfer: path },
        ]
    );
}

#[tokio::test]
async fn agent_hears_about_transfer_errors() {
    let mut ctx = setup();
    let session = with_agent(&mut ctx).await;

    let id = ctx.client.get(session, GetRequest::default(), None).unwrap();
    ctx.settle().await;
    assert!(ctx.obex.emit_error(id, "link lost"));
    ctx.settle().await;

    assert!(ctx.agents.calls().contains(&AgentCall::Error {
        transfer: transfer_path(id),
        message: "link lost".to_string(),
    }));
}

#[tokio::test]
async fn queued_transfers_are_authorized_in_turn() {
    let mut ctx = setup();
    let session = with_agent(&mut ctx).await;

    let t1 = ctx.client.get(session, GetRequest::default(), None).unwrap();
    let t2 = ctx.client.get(session, GetRequest::default(), None).unwrap();
    ctx.settle().await;
    assert_eq!(ctx.agents.requests(), vec![transfer_path(t1)]);

    assert!(ctx.obex.complete(t1));
    ctx.settle().await;

    assert_eq!(
        ctx.agents.requests(),
        vec![transfer_path(t1), transfer_path(t2)]
    );
    assert_eq!(ctx.started_ids(), vec![t1, t2]);
}

#[yare::parameterized(
    relative = { "agent" },
    trailing_slash = { "/org/agent/" },
    empty = { "" },
)]
fn assign_agent_rejects_bad_paths(path: &str) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let mut ctx = setup();
        let session = ctx.connected(opp().channel(9)).await;

        let err = ctx.client.assign_agent(session, AGENT, path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
        assert!(ctx.client.agent(session).is_none());
    });
}

#[tokio::test]
async fn second_agent_already_exists() {
    let mut ctx = setup();
    let session = with_agent(&mut ctx).await;

    let err = ctx
        .client
        .assign_agent(session, ":1.10", "/other/agent")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(
        ctx.client.agent(session),
        Some(AgentBinding {
            name: BusName::new(AGENT),
            path: ObjectPath::parse(AGENT_PATH).unwrap(),
        })
    );
}

#[tokio::test]
async fn release_agent_checks_the_caller() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;

    // Nothing bound is not an error
    assert!(ctx.client.release_agent(session, AGENT, AGENT_PATH).is_ok());

    ctx.client.assign_agent(session, AGENT, AGENT_PATH).unwrap();
    for (name, path) in [(":1.10", AGENT_PATH), (AGENT, "/org/example/other")] {
        let err = ctx.client.release_agent(session, name, path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
    }

    ctx.client.release_agent(session, AGENT, AGENT_PATH).unwrap();
    assert!(ctx.client.agent(session).is_none());
    // Released explicitly, so no Release callback
    assert!(ctx.agents.calls().is_empty());
}

#[tokio::test]
async fn agent_principal_becomes_the_owner() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;
    assert_eq!(ctx.client.owner(session), None);

    ctx.client.assign_agent(session, AGENT, AGENT_PATH).unwrap();
    ctx.settle().await;
    assert_eq!(ctx.client.owner(session), Some(BusName::new(AGENT)));
    assert_eq!(ctx.bus.active_watches(), 1);

    ctx.bus.disconnect_name(AGENT);
    ctx.settle().await;

    assert_eq!(ctx.state(session), SessionState::ShuttingDown);
    assert_eq!(ctx.obex.disconnects(), 1);
}

#[tokio::test]
async fn existing_owner_is_kept_when_an_agent_binds() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9).owner(":1.5")).await;

    ctx.client.assign_agent(session, AGENT, AGENT_PATH).unwrap();

    assert_eq!(ctx.client.owner(session), Some(BusName::new(":1.5")));
}

#[derive(Clone, Default)]
struct RecordingDriver {
    fail_probe: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingDriver {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Driver for RecordingDriver {
    fn service(&self) -> &str {
        OPP.service
    }

    fn uuid(&self) -> &str {
        OPP.uuid
    }

    fn target(&self) -> Option<&[u8]> {
        None
    }

    fn probe(&self, _session: SessionId, path: &ObjectPath) -> Result<(), ObcError> {
        self.calls.lock().unwrap().push(format!("probe {path}"));
        if self.fail_probe {
            return Err(ObcError::invalid_arguments("probe refused"));
        }
        Ok(())
    }

    fn remove(&self, _session: SessionId, path: &ObjectPath) {
        self.calls.lock().unwrap().push(format!("remove {path}"));
    }
}

fn setup_recording(driver: &RecordingDriver) -> TestContext {
    let mut drivers = DriverRegistry::with_defaults();
    drivers.register(driver.clone());
    setup_with(ClientConfig::default(), drivers)
}

#[tokio::test]
async fn register_assigns_a_stable_path() {
    let driver = RecordingDriver::default();
    let mut ctx = setup_recording(&driver);
    let first = ctx.connected(opp().channel(9)).await;
    let second = ctx.connected(opp().channel(4)).await;

    let path = ctx.client.register(first).unwrap();
    assert_eq!(path, *"/org/openobex/session0");
    assert_eq!(ctx.client.register(first).unwrap(), path);
    assert_eq!(ctx.client.path(first), Some(path.clone()));
    assert_eq!(
        ctx.client.register(second).unwrap(),
        *"/org/openobex/session1"
    );

    assert!(ctx.bus.is_registered("/org/openobex/session0"));
    assert_eq!(
        driver.calls(),
        vec![
            "probe /org/openobex/session0".to_string(),
            "probe /org/openobex/session1".to_string(),
        ]
    );
}

#[tokio::test]
async fn probe_failure_rolls_the_export_back() {
    let driver = RecordingDriver {
        fail_probe: true,
        ..RecordingDriver::default()
    };
    let mut ctx = setup_recording(&driver);
    let session = ctx.connected(opp().channel(9)).await;

    let err = ctx.client.register(session).unwrap_err();

    assert_eq!(err.message(), "probe refused");
    assert!(ctx.client.path(session).is_none());
    assert!(!ctx.bus.is_registered("/org/openobex/session0"));
    // The counter is not reused
    let err = ctx.client.register(session).unwrap_err();
    assert_eq!(err.message(), "probe refused");
    assert_eq!(driver.calls().last().unwrap(), "probe /org/openobex/session1");
}

#[tokio::test]
async fn bus_refusal_is_reported() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;
    ctx.bus.set_register_error(Some(obc_adapters::BusError::AlreadyRegistered(
        "/org/openobex/session0".to_string(),
    )));

    let err = ctx.client.register(session).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert!(ctx.client.path(session).is_none());
}

#[tokio::test]
async fn destruction_releases_agent_and_export() {
    let driver = RecordingDriver::default();
    let mut ctx = setup_recording(&driver);
    let session = with_agent(&mut ctx).await;
    let path = ctx.client.register(session).unwrap();

    assert!(ctx.client.session_unref(session));
    ctx.settle().await;

    assert!(ctx.agents.calls().contains(&AgentCall::Release {
        agent: AgentBinding {
            name: BusName::new(AGENT),
            path: ObjectPath::parse(AGENT_PATH).unwrap(),
        }
    }));
    assert!(ctx.bus.calls().contains(&BusCall::Unregister {
        path: path.clone(),
        interface: SESSION_INTERFACE.to_string(),
    }));
    assert_eq!(driver.calls().last().unwrap(), &format!("remove {path}"));
    assert_eq!(ctx.bus.active_watches(), 0);
}

#[tokio::test]
async fn properties_reflect_the_request() {
    let mut ctx = setup();
    let session = ctx.connected(opp().channel(9)).await;

    let properties = ctx.client.properties(session).unwrap();

    assert_eq!(properties.source, None);
    assert_eq!(properties.destination, DEST);
    assert_eq!(properties.channel, 9);
    assert_eq!(
        ctx.client.properties(SessionId::from(42)).unwrap_err().kind(),
        ErrorKind::InvalidArguments
    );
}
