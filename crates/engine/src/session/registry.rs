// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-scoped session table.
//!
//! The arena owns every live [`Session`]. Two lookup lists sit beside it:
//! `connected` holds sessions with a proven OBEX link and serves general
//! reuse; `connecting` holds in-flight sessions and only serves callers
//! repeating the exact same request. Neither list holds a reference.

use super::{Session, SessionKey};
use obc_core::{AttemptId, Sequence, SessionId, TransferId};
use std::collections::HashMap;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    connected: Vec<SessionId>,
    connecting: Vec<SessionId>,
    session_ids: Sequence,
    transfer_ids: Sequence,
    paths: u64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_session_id(&mut self) -> SessionId {
        self.session_ids.next()
    }

    pub fn next_transfer_id(&mut self) -> TransferId {
        self.transfer_ids.next()
    }

    /// Index for the next exported session path, starting at zero.
    pub fn next_path_index(&mut self) -> u64 {
        let index = self.paths;
        self.paths += 1;
        index
    }

    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.id, session);
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Take a session out of the arena and both lookup lists.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        self.forget(id);
        self.sessions.remove(&id)
    }

    /// Most recently connected session matching `query`.
    pub fn find_connected(&self, query: &SessionKey) -> Option<SessionId> {
        self.connected
            .iter()
            .rev()
            .copied()
            .find(|id| self.sessions.get(id).is_some_and(|s| s.key.matches(query)))
    }

    /// In-flight session started for exactly `key`.
    pub fn find_connecting(&self, key: &SessionKey) -> Option<SessionId> {
        self.connecting
            .iter()
            .copied()
            .find(|id| self.sessions.get(id).is_some_and(|s| &s.key == key))
    }

    /// In-flight session waiting on a transport attempt.
    pub fn find_by_attempt(&self, transport: &str, attempt: AttemptId) -> Option<SessionId> {
        self.connecting.iter().copied().find(|id| {
            self.sessions
                .get(id)
                .is_some_and(|s| s.transport == transport && s.attempt == Some(attempt))
        })
    }

    pub fn add_connecting(&mut self, id: SessionId) {
        if !self.connecting.contains(&id) {
            self.connecting.push(id);
        }
    }

    /// Move a session from the connecting list to the reusable list.
    pub fn promote(&mut self, id: SessionId) {
        self.connecting.retain(|s| *s != id);
        if !self.connected.contains(&id) {
            self.connected.push(id);
        }
    }

    /// Drop a session from both lookup lists, leaving it in the arena.
    pub fn forget(&mut self, id: SessionId) {
        self.connecting.retain(|s| *s != id);
        self.connected.retain(|s| *s != id);
    }

    /// Whether lookups can find the session
    #[cfg(test)]
    pub(crate) fn is_reusable(&self, id: SessionId) -> bool {
        self.connected.contains(&id)
    }

    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
