// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session references, shutdown and destruction

use super::agent::unexport;
use super::{unknown_session, Client};
use crate::session::SessionState;
use obc_adapters::{AgentAdapter, BusAdapter, ObexAdapter};
use obc_core::{ObcError, Release, SessionId};

impl<O, A, U> Client<O, A, U>
where
    O: ObexAdapter,
    A: AgentAdapter,
    U: BusAdapter,
{
    /// Take another reference on a session. Returns the new count.
    pub fn session_ref(&mut self, session: SessionId) -> Result<u32, ObcError> {
        let entry = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| unknown_session(session))?;
        Ok(entry.refs.acquire())
    }

    /// Drop one reference. Returns true if this destroyed the session.
    pub fn session_unref(&mut self, session: SessionId) -> bool {
        let Some(entry) = self.sessions.get_mut(session) else {
            tracing::warn!(%session, "unref of unknown session");
            return false;
        };
        match entry.refs.release() {
            Release::Last => {
                self.destroy(session);
                true
            }
            Release::Alive(refs) => {
                tracing::debug!(%session, refs, "session unref");
                false
            }
            Release::Stale => {
                tracing::warn!(%session, "unref of released session");
                false
            }
        }
    }

    /// Tear a session down now, whoever else holds it.
    ///
    /// Outstanding calls are cancelled and connect waiters get `Cancelled`.
    /// Queued transfers are unregistered without reports. The export is
    /// withdrawn and the transport or OBEX link disconnected. The session
    /// stays allocated until its last reference goes.
    pub fn shutdown(&mut self, session: SessionId) -> Result<(), ObcError> {
        let entry = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| unknown_session(session))?;
        tracing::info!(%session, state = ?entry.state, queued = entry.queue.len(), "session shutdown");

        entry.refs.acquire();
        let cancelled = entry.calls.cancel_all();
        entry.resolve_waiters(Err(ObcError::cancelled("Session shut down")));

        let queued: Vec<_> = entry.queue.drain(..).collect();
        for transfer in &queued {
            self.obex.unregister_transfer(transfer.id);
            if entry.refs.release() == Release::Stale {
                tracing::warn!(%session, transfer = %transfer.id, "transfer held no reference");
            }
        }

        unexport(&self.bus, entry);
        if let Some(attempt) = entry.attempt.take() {
            if let Some(transport) = self.transports.get_mut(&entry.transport) {
                transport.disconnect(attempt);
            }
        }
        if let Some(link) = entry.link.take() {
            self.obex.disconnect(&link);
        }
        entry.state = SessionState::ShuttingDown;
        tracing::debug!(%session, cancelled, unregistered = queued.len(), "session shut down");

        self.sessions.forget(session);
        self.session_unref(session);
        Ok(())
    }

    /// Destroy every session regardless of references. Returns how many.
    pub fn shutdown_all(&mut self) -> usize {
        let ids = self.sessions.ids();
        for id in &ids {
            if let Err(e) = self.shutdown(*id) {
                tracing::debug!(session = %id, error = %e, "shutdown skipped");
            }
            self.destroy(*id);
        }
        ids.len()
    }

    /// Free a session and everything it holds.
    pub(super) fn destroy(&mut self, session: SessionId) {
        let Some(mut entry) = self.sessions.remove(session) else {
            return;
        };
        entry.calls.cancel_all();
        entry.resolve_waiters(Err(ObcError::cancelled("Session destroyed")));
        for transfer in entry.queue.drain(..) {
            self.obex.unregister_transfer(transfer.id);
        }
        if let Some(agent) = entry.agent.take() {
            self.agents.release(&agent);
        }
        if let Some(link) = entry.link.take() {
            self.obex.disconnect(&link);
        }
        if let Some(attempt) = entry.attempt.take() {
            if let Some(transport) = self.transports.get_mut(&entry.transport) {
                transport.disconnect(attempt);
            }
        }
        unexport(&self.bus, &mut entry);
        tracing::info!(%session, "session destroyed");
    }
}
