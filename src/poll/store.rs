//! Session store abstraction for the poll transport
//!
//! The poll transport has no durable connection to hang state off, so every
//! session lives as a record in a shared store: profile snapshot, partner
//! pointer, a per-session inbox of pending events, and an activity
//! timestamp that drives expiry.
//!
//! # Atomicity contract
//!
//! Every trait method is one transaction: concurrent callers observe it
//! entirely or not at all. This matters most for [`SessionStore::join`],
//! which must perform find-compatible-and-claim as a single step: two
//! near-simultaneous joins that see each other as compatible must resolve
//! to exactly one claimed pair, with the loser either parked `Waiting` or
//! observing itself already claimed. An implementation over an external
//! database must use a transactional or conditional update here; the
//! in-process [`MemoryStore`](super::memory::MemoryStore) gets this from a
//! single mutex.
//!
//! Timestamps are passed in by the caller rather than read from the clock,
//! which keeps expiry behavior testable without sleeping.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::{Event, PartnerInfo};
use crate::profile::Profile;
use crate::registry::{SessionId, SessionState};

/// One pending delivery in a session's inbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxEvent {
    /// The event awaiting delivery
    pub event: Event,
    /// When it was enqueued
    pub created_at: SystemTime,
}

/// Durable session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session id (poll identity, allocated at first join)
    pub id: SessionId,

    /// Matchmaking state
    pub state: SessionState,

    /// Profile snapshot from the most recent join
    pub profile: Profile,

    /// Matched peer, if any
    pub partner: Option<SessionId>,

    /// Pending events, cleared atomically when drained
    pub inbox: Vec<InboxEvent>,

    /// Refreshed on every request from this session; drives expiry
    pub last_active: SystemTime,

    /// When the session entered the waiting set; queue order for the
    /// deterministic earliest-compatible selection
    pub enqueued_at: SystemTime,
}

impl SessionRecord {
    /// Create a fresh waiting record
    pub fn new(id: SessionId, profile: Profile, now: SystemTime) -> Self {
        Self {
            id,
            state: SessionState::Waiting,
            profile,
            partner: None,
            inbox: Vec::new(),
            last_active: now,
            enqueued_at: now,
        }
    }

    /// Partner-facing view of this record
    pub fn partner_info(&self) -> PartnerInfo {
        PartnerInfo::from_profile(Some(self.id), &self.profile)
    }
}

/// Result of a join call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JoinOutcome {
    /// No compatible fresh candidate; the caller is parked in the pool
    Waiting,
    /// Claimed a pair within this call; the already-waiting side learns of
    /// the match from its inbox on its next poll. `initiator` follows the
    /// uniform rule: the later-enqueued side of the pair sends the first
    /// offer, which is the caller except when a profile refresh on an
    /// older queue position triggered the claim.
    Matched { initiator: bool, partner: PartnerInfo },
}

/// What a poll call returns: drained inbox plus current pairing state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSnapshot {
    /// Current matchmaking state
    pub state: SessionState,
    /// Current partner, resolved to its profile view when still present
    pub partner: Option<PartnerInfo>,
    /// Events since the last poll, in enqueue order; never redelivered
    pub events: Vec<Event>,
}

/// Storage backend for the poll transport
///
/// See the module docs for the per-method atomicity contract.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Upsert the caller as waiting (refreshing profile and activity) and
    /// atomically claim the earliest compatible fresh candidate, if any.
    ///
    /// A caller that was `Matched` is first uncoupled as if it had skipped:
    /// its partner gets a `PartnerLeft` inbox event and returns to `Idle`.
    /// On a claim, the candidate's inbox receives its `Matched` event
    /// within the same transaction.
    async fn join(
        &self,
        id: SessionId,
        profile: Profile,
        now: SystemTime,
        freshness: Duration,
    ) -> Result<JoinOutcome>;

    /// Refresh the caller's activity timestamp and drain its inbox
    /// (return-then-clear). Unknown id means the record expired; the
    /// caller must rejoin from scratch.
    async fn poll(&self, id: SessionId, now: SystemTime) -> Result<PollSnapshot>;

    /// Current partner pointer of a session. Errors if the session itself
    /// is gone.
    async fn partner_of(&self, id: SessionId) -> Result<Option<SessionId>>;

    /// Append an event to a session's inbox. Errors if the destination
    /// record no longer exists.
    async fn push_event(&self, id: SessionId, event: Event, now: SystemTime) -> Result<()>;

    /// Remove the caller's record. A remaining partner gets `PartnerLeft`
    /// in its inbox and is uncoupled, all in the same transaction.
    /// Idempotent: leaving an unknown session is a no-op.
    async fn leave(&self, id: SessionId, now: SystemTime) -> Result<()>;

    /// Purge every record inactive for at least `ttl`. Partners of purged
    /// sessions are uncoupled and receive `PartnerLeft`. Returns the
    /// number of records purged.
    async fn sweep(&self, now: SystemTime, ttl: Duration) -> Result<usize>;
}
