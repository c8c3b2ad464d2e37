// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use obc_core::BusName;

#[tokio::test]
async fn noop_agent_authorizes_without_renaming() {
    let agents = NoOpAgentAdapter::new();
    let binding = AgentBinding {
        name: BusName::new(":1.7"),
        path: ObjectPath::parse("/agent").unwrap(),
    };
    let transfer = ObjectPath::parse("/org/openobex/transfer1").unwrap();

    assert_eq!(agents.request(&binding, &transfer).await.unwrap(), "");
    agents.notify_progress(&binding, &transfer, 10);
    agents.notify_complete(&binding, &transfer);
    agents.release(&binding);
}

#[test]
fn noop_agent_default() {
    let adapter = NoOpAgentAdapter::default();
    assert!(std::mem::size_of_val(&adapter) == 0);
}
