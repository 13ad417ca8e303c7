//! In-memory session registry
//!
//! Owns every session known to the push transport plus the waiting queue.
//! This is a plain owned value with synchronous methods; the push hub wraps
//! it in a lock, and tests construct it directly with no shared global
//! state. Queue membership is implied by session state: the queue never
//! holds an id whose session is not `Waiting` for longer than one scan
//! (stale ids are pruned lazily when a match is attempted).

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::matcher::{self, Candidate, MatchPair};
use crate::profile::Profile;

use super::session::{Session, SessionId, SessionState};

/// Session registry for the push transport
#[derive(Debug, Default)]
pub struct Registry {
    /// All known sessions
    sessions: HashMap<SessionId, Session>,

    /// Waiting sessions in enqueue order
    queue: Vec<SessionId>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly connected session and return its id
    pub fn add(&mut self) -> SessionId {
        let id = SessionId::generate();
        self.sessions.insert(id, Session::new(id));
        id
    }

    /// Look up a session
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Current partner of a session, if it is matched
    pub fn partner_of(&self, id: SessionId) -> Option<SessionId> {
        self.sessions.get(&id).and_then(|s| s.partner)
    }

    /// Number of sessions currently waiting
    pub fn waiting_count(&self) -> usize {
        self.sessions.values().filter(|s| s.is_waiting()).count()
    }

    /// Total number of registered sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry holds no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Enter the queue (or refresh an existing wait) and attempt a match
    ///
    /// Rewrites the profile snapshot from the request payload. A session
    /// already `Waiting` keeps its queue position; the refreshed profile may
    /// still enable a match that the old one did not. On success both sides
    /// are transitioned to `Matched` atomically with mutual partner
    /// pointers.
    pub fn join(&mut self, id: SessionId, profile: Profile) -> Result<Option<MatchPair>> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(Error::SessionNotFound(id))?;

        if session.is_waiting() {
            // Idempotent re-join: refresh the snapshot, keep queue position
            session.profile = profile;
        } else {
            session.start_waiting(profile);
            self.queue.push(id);
        }

        Ok(self.try_match())
    }

    /// Scan the queue for the earliest compatible pair and apply it
    fn try_match(&mut self) -> Option<MatchPair> {
        // Prune ids whose session is gone or no longer waiting
        let sessions = &self.sessions;
        self.queue
            .retain(|id| sessions.get(id).is_some_and(|s| s.is_waiting()));

        let pair = {
            let candidates: Vec<Candidate<'_>> = self
                .queue
                .iter()
                .filter_map(|id| {
                    self.sessions.get(id).map(|s| Candidate {
                        id: *id,
                        profile: &s.profile,
                    })
                })
                .collect();
            matcher::select_pair(&candidates)?
        };

        self.queue
            .retain(|id| *id != pair.responder && *id != pair.initiator);

        if let Some(session) = self.sessions.get_mut(&pair.responder) {
            session.state = SessionState::Matched;
            session.partner = Some(pair.initiator);
        }
        if let Some(session) = self.sessions.get_mut(&pair.initiator) {
            session.state = SessionState::Matched;
            session.partner = Some(pair.responder);
        }

        tracing::debug!(
            responder = %pair.responder,
            initiator = %pair.initiator,
            waiting = self.queue.len(),
            "Pair matched"
        );

        Some(pair)
    }

    /// Remove a session entirely (disconnect)
    ///
    /// Returns the orphaned partner id if the session was matched, after
    /// force-transitioning that partner back to `Idle`. The partner is never
    /// re-queued automatically.
    pub fn remove(&mut self, id: SessionId) -> Option<SessionId> {
        let session = self.sessions.remove(&id)?;
        self.queue.retain(|q| *q != id);

        let partner_id = session.partner?;
        let partner = self.sessions.get_mut(&partner_id)?;
        partner.uncouple();
        Some(partner_id)
    }

    /// Reset a session to the just-connected state (skip support)
    ///
    /// Clears its pairing and profile as if it had newly connected. Returns
    /// the orphaned partner id, uncoupled, same as [`Registry::remove`].
    pub fn reset(&mut self, id: SessionId) -> Result<Option<SessionId>> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(Error::SessionNotFound(id))?;

        let former = session.partner;
        session.reset();
        self.queue.retain(|q| *q != id);

        let orphan = former.and_then(|pid| {
            let partner = self.sessions.get_mut(&pid)?;
            partner.uncouple();
            Some(pid)
        });

        Ok(orphan)
    }
}
