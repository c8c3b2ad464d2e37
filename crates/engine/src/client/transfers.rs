// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer queue: enqueue, agent authorization, start and advance.
//!
//! Only the queue head may leave `Queued`. When it finishes the next entry
//! is authorized and started without caller involvement.

use super::{spawn_session_call, unknown_session, Client};
use crate::event::SessionOutcome;
use crate::pending::CallKind;
use crate::session::{Transfer, TransferOutcome, TransferReport, TransferState, TransferStatus};
use obc_adapters::{
    AgentAdapter, AgentError, BusAdapter, ObexAdapter, ProgressEvent, ProgressSink,
    ProgressUpdate, TransferKind, TransferPayload, TransferRequest,
};
use obc_core::{ObcError, Release, SessionId, TransferId};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Completion channel a get or pull caller may install on the session.
pub type Notifier = mpsc::UnboundedSender<TransferReport>;

/// Fetch an object, into `name` when given or into memory otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetRequest {
    pub mime_type: Option<String>,
    pub name: Option<String>,
    pub target: Option<String>,
    pub params: Option<Vec<u8>>,
}

/// Fetch an object into memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequest {
    pub mime_type: Option<String>,
    pub target: Option<String>,
}

/// Push an in-memory buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutRequest {
    pub buffer: Vec<u8>,
    pub target: Option<String>,
}

/// Push a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub file: PathBuf,
    pub target: Option<String>,
}

struct NewTransfer {
    kind: TransferKind,
    name: Option<String>,
    target: Option<String>,
    mime_type: Option<String>,
    params: Option<Vec<u8>>,
    payload: TransferPayload,
}

impl<O, A, U> Client<O, A, U>
where
    O: ObexAdapter,
    A: AgentAdapter,
    U: BusAdapter,
{
    /// Queue a get. May wait behind other transfers.
    pub fn get(
        &mut self,
        session: SessionId,
        request: GetRequest,
        notifier: Option<Notifier>,
    ) -> Result<TransferId, ObcError> {
        let payload = match &request.name {
            Some(name) => TransferPayload::File(PathBuf::from(name)),
            None => TransferPayload::Memory,
        };
        self.enqueue(
            session,
            NewTransfer {
                kind: TransferKind::Get,
                name: request.name,
                target: request.target,
                mime_type: request.mime_type,
                params: request.params,
                payload,
            },
            notifier,
        )
    }

    /// Queue a pull. May wait behind other transfers.
    pub fn pull(
        &mut self,
        session: SessionId,
        request: PullRequest,
        notifier: Option<Notifier>,
    ) -> Result<TransferId, ObcError> {
        self.enqueue(
            session,
            NewTransfer {
                kind: TransferKind::Pull,
                name: None,
                target: request.target,
                mime_type: request.mime_type,
                params: None,
                payload: TransferPayload::Memory,
            },
            notifier,
        )
    }

    /// Queue a put. Fails with `AlreadyBusy` unless the queue is empty.
    pub fn put(&mut self, session: SessionId, request: PutRequest) -> Result<TransferId, ObcError> {
        self.enqueue(
            session,
            NewTransfer {
                kind: TransferKind::Put,
                name: None,
                target: request.target,
                mime_type: None,
                params: None,
                payload: TransferPayload::Buffer(request.buffer),
            },
            None,
        )
    }

    /// Queue a file send. Starts only if it is first in the queue.
    pub fn send(
        &mut self,
        session: SessionId,
        request: SendRequest,
    ) -> Result<TransferId, ObcError> {
        self.enqueue(
            session,
            NewTransfer {
                kind: TransferKind::Send,
                name: Some(request.file.display().to_string()),
                target: request.target,
                mime_type: None,
                params: None,
                payload: TransferPayload::File(request.file),
            },
            None,
        )
    }

    fn enqueue(
        &mut self,
        id: SessionId,
        new: NewTransfer,
        notifier: Option<Notifier>,
    ) -> Result<TransferId, ObcError> {
        let transfer_id = self.sessions.next_transfer_id();
        let session = self.sessions.get_mut(id).ok_or_else(|| unknown_session(id))?;
        let link = session.link.ok_or_else(ObcError::not_connected)?;
        if new.kind == TransferKind::Put && !session.queue.is_empty() {
            return Err(ObcError::already_busy());
        }

        let request = TransferRequest {
            id: transfer_id,
            kind: new.kind,
            name: new.name,
            target: new.target,
            mime_type: new.mime_type,
            params: new.params,
            payload: new.payload,
            agent: session.agent.as_ref().map(|a| a.name.clone()),
        };
        let registration = self.obex.register_transfer(&link, &request).map_err(|e| {
            tracing::warn!(session = %id, error = %e, "transfer registration failed");
            ObcError::transfer_failed(e.to_string())
        })?;

        if let Some(notifier) = notifier {
            session.notifier = Some(notifier);
        }
        let idle = session.queue.is_empty();
        session.queue.push_back(Transfer::new(
            transfer_id,
            request.kind,
            request.name,
            registration.path,
            registration.size,
        ));
        let refs = session.refs.acquire();
        tracing::info!(
            session = %id,
            transfer = %transfer_id,
            kind = request.kind.as_str(),
            queued = session.queue.len(),
            refs,
            "transfer queued"
        );

        if idle {
            self.advance(id);
        }
        Ok(transfer_id)
    }

    /// Start the head, or hand it to the agent first. A head that fails to
    /// start is finished and the next entry tried.
    pub(super) fn advance(&mut self, id: SessionId) {
        loop {
            let Some(session) = self.sessions.get_mut(id) else {
                return;
            };
            let Some(head) = session.queue.front_mut() else {
                return;
            };
            if head.state != TransferState::Queued {
                return;
            }

            if let (Some(agent), Some(path)) = (session.agent.clone(), head.path.clone()) {
                head.state = TransferState::Authorizing;
                let transfer = head.id;
                tracing::debug!(session = %id, %transfer, agent = %agent.name, "authorizing");
                let agents = self.agents.clone();
                spawn_session_call(
                    &mut session.calls,
                    CallKind::AgentRequest(transfer),
                    &self.events,
                    id,
                    async move { SessionOutcome::AgentReply(agents.request(&agent, &path).await) },
                );
                return;
            }

            match self.begin(id) {
                Ok(()) => return,
                Err(e) => {
                    if !self.finish_head(id, TransferOutcome::Failed(e)) {
                        return;
                    }
                }
            }
        }
    }

    fn begin(&mut self, id: SessionId) -> Result<(), ObcError> {
        let session = self.sessions.get_mut(id).ok_or_else(|| unknown_session(id))?;
        let link = session.link.ok_or_else(ObcError::not_connected)?;
        let Some(head) = session.queue.front_mut() else {
            return Ok(());
        };
        let sink = ProgressSink::new(id, head.id, self.progress_tx.clone());
        self.obex
            .start_transfer(&link, head.id, head.via, head.name.as_deref(), sink)
            .map_err(|e| ObcError::transfer_failed(e.to_string()))?;
        head.state = TransferState::Active;
        tracing::info!(
            session = %id,
            transfer = %head.id,
            kind = head.kind.as_str(),
            direction = ?head.via,
            "transfer started"
        );
        Ok(())
    }

    /// Finish the head and advance the queue.
    fn complete_head(&mut self, id: SessionId, outcome: TransferOutcome) {
        if self.finish_head(id, outcome) {
            self.advance(id);
        }
    }

    /// Remove the head, tell the agent and the notifier, and release the
    /// head's reference. Returns false if that destroyed the session.
    fn finish_head(&mut self, id: SessionId, outcome: TransferOutcome) -> bool {
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };
        let Some(head) = session.queue.pop_front() else {
            return true;
        };

        if let (Some(agent), Some(path)) = (&session.agent, &head.path) {
            match &outcome {
                TransferOutcome::Complete => self.agents.notify_complete(agent, path),
                TransferOutcome::Failed(e) => self.agents.notify_error(agent, path, e.message()),
                TransferOutcome::Refused(_) => {}
            }
        }

        let status = match outcome {
            TransferOutcome::Complete => {
                tracing::info!(session = %id, transfer = %head.id, "transfer complete");
                TransferStatus::Complete
            }
            TransferOutcome::Failed(e) | TransferOutcome::Refused(e) => {
                tracing::warn!(session = %id, transfer = %head.id, error = %e, "transfer failed");
                TransferStatus::Failed(e)
            }
        };
        session.report(TransferReport {
            session: id,
            transfer: head.id,
            status,
        });
        self.obex.unregister_transfer(head.id);

        // Without a notifier the next entry goes through the configured rule
        let own_direction = session.notifier.is_some();
        let rule = self.config.queue_advance;
        if let Some(next) = session.queue.front_mut() {
            let own = next.kind.direction();
            next.via = if own_direction { own } else { rule.direction(own) };
        }

        match session.refs.release() {
            Release::Last => {
                self.destroy(id);
                false
            }
            Release::Alive(_) => true,
            Release::Stale => {
                tracing::warn!(session = %id, "transfer released an unreferenced session");
                true
            }
        }
    }

    pub(super) fn on_agent_reply(
        &mut self,
        id: SessionId,
        transfer: TransferId,
        reply: Result<String, AgentError>,
    ) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        let Some(head) = session
            .queue
            .front_mut()
            .filter(|h| h.id == transfer && h.state == TransferState::Authorizing)
        else {
            tracing::debug!(session = %id, %transfer, "agent reply for non-head transfer dropped");
            return;
        };

        match reply {
            Ok(name) => {
                if !name.is_empty() {
                    tracing::debug!(session = %id, %transfer, %name, "agent renamed transfer");
                    head.name = Some(name);
                }
                head.state = TransferState::Queued;
                if let Err(e) = self.begin(id) {
                    self.complete_head(id, TransferOutcome::Failed(e));
                }
            }
            Err(e) => {
                tracing::warn!(session = %id, %transfer, error = %e, "agent refused transfer");
                self.complete_head(id, TransferOutcome::Refused(ObcError::cancelled(e.message())));
            }
        }
    }

    pub(super) fn handle_progress(&mut self, update: ProgressUpdate) {
        let id = update.session;
        let Some(session) = self.sessions.get_mut(id) else {
            tracing::debug!(session = %id, transfer = %update.transfer, "progress for destroyed session dropped");
            return;
        };
        let Some(head) = session
            .queue
            .front_mut()
            .filter(|h| h.id == update.transfer && h.state == TransferState::Active)
        else {
            tracing::debug!(session = %id, transfer = %update.transfer, "stale progress dropped");
            return;
        };

        match update.event {
            ProgressEvent::Progress { transferred, size } => {
                head.transferred = transferred;
                head.size = size;
                let transfer = head.id;
                if let (Some(agent), Some(path)) = (&session.agent, &head.path) {
                    self.agents.notify_progress(agent, path, transferred);
                }
                session.report(TransferReport {
                    session: id,
                    transfer,
                    status: TransferStatus::Progress { transferred, size },
                });
                tracing::debug!(session = %id, %transfer, transferred, size, "progress");
                if transferred == size {
                    self.complete_head(id, TransferOutcome::Complete);
                }
            }
            ProgressEvent::Failed(message) => {
                self.complete_head(id, TransferOutcome::Failed(ObcError::transfer_failed(message)));
            }
        }
    }
}
