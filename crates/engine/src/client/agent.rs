// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session surface used by IPC callers: agent binding, export and properties

use super::{unknown_session, watch_owner, Client};
use crate::session::{Session, SessionProperties};
use obc_adapters::{
    AgentAdapter, AgentBinding, BusAdapter, BusError, ObexAdapter, SESSION_INTERFACE,
};
use obc_core::{BusName, ObcError, ObjectPath, SessionId};

impl<O, A, U> Client<O, A, U>
where
    O: ObexAdapter,
    A: AgentAdapter,
    U: BusAdapter,
{
    /// Bind `name` at `path` as the session's agent.
    ///
    /// If nobody is watched yet the agent's principal becomes the owner, so
    /// its disappearance shuts the session down.
    pub fn assign_agent(
        &mut self,
        session: SessionId,
        name: &str,
        path: &str,
    ) -> Result<(), ObcError> {
        let path = ObjectPath::parse(path)?;
        if name.is_empty() {
            return Err(ObcError::invalid_arguments("Invalid arguments in method call"));
        }
        let entry = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| unknown_session(session))?;
        if entry.agent.is_some() {
            return Err(ObcError::already_exists());
        }

        let binding = AgentBinding {
            name: BusName::new(name),
            path,
        };
        if entry.watched.is_none() {
            watch_owner(&self.bus, &self.events, entry, binding.name.clone());
        }
        tracing::info!(%session, agent = %binding.name, path = %binding.path, "agent assigned");
        entry.agent = Some(binding);
        Ok(())
    }

    /// Unbind the agent. Only the bound principal at its own path may do so.
    pub fn release_agent(
        &mut self,
        session: SessionId,
        name: &str,
        path: &str,
    ) -> Result<(), ObcError> {
        let entry = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| unknown_session(session))?;
        let Some(agent) = &entry.agent else {
            return Ok(());
        };
        if agent.name.as_str() != name || agent.path.as_str() != path {
            return Err(ObcError::not_authorized());
        }
        tracing::info!(%session, agent = %agent.name, "agent released");
        entry.agent = None;
        Ok(())
    }

    /// Export the session on the bus. The path is assigned once and reused.
    pub fn register(&mut self, session: SessionId) -> Result<ObjectPath, ObcError> {
        let entry = self
            .sessions
            .get(session)
            .ok_or_else(|| unknown_session(session))?;
        if let Some(path) = &entry.path {
            return Ok(path.clone());
        }

        let index = self.sessions.next_path_index();
        let path = ObjectPath::parse(format!(
            "{}/session{index}",
            self.config.session_base_path
        ))?;
        self.bus
            .register_object(&path, SESSION_INTERFACE)
            .map_err(|e| match e {
                BusError::AlreadyRegistered(_) => ObcError::already_exists(),
                BusError::Failed(message) => ObcError::invalid_arguments(message),
            })?;

        let entry = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| unknown_session(session))?;
        if let Err(e) = entry.driver.probe(session, &path) {
            tracing::warn!(%session, %path, error = %e, "driver probe failed");
            self.bus.unregister_object(&path, SESSION_INTERFACE);
            return Err(e);
        }
        tracing::info!(%session, %path, "session registered");
        entry.path = Some(path.clone());
        Ok(path)
    }

    pub fn properties(&self, session: SessionId) -> Result<SessionProperties, ObcError> {
        self.sessions
            .get(session)
            .map(Session::properties)
            .ok_or_else(|| unknown_session(session))
    }

    pub fn path(&self, session: SessionId) -> Option<ObjectPath> {
        self.sessions.get(session)?.path.clone()
    }

    pub fn agent(&self, session: SessionId) -> Option<AgentBinding> {
        self.sessions.get(session)?.agent.clone()
    }

    /// Principal whose departure shuts the session down.
    pub fn owner(&self, session: SessionId) -> Option<BusName> {
        self.sessions.get(session)?.watched.clone()
    }
}

/// Withdraw an exported session path.
pub(super) fn unexport<U: BusAdapter>(bus: &U, session: &mut Session) {
    if let Some(path) = session.path.take() {
        session.driver.remove(session.id, &path);
        bus.unregister_object(&path, SESSION_INTERFACE);
        tracing::debug!(session = %session.id, %path, "session unregistered");
    }
}
