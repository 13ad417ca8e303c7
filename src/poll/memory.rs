//! In-process session store
//!
//! Reference [`SessionStore`] implementation backed by a single mutex over
//! the record map. Holding the lock for the whole of each method makes
//! every trait operation trivially transactional, including the
//! find-compatible-and-claim step of `join`. Useful on its own for
//! single-process deployments and as the behavioral model an external
//! store implementation must reproduce.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::event::{Event, PartnerInfo};
use crate::matcher;
use crate::profile::Profile;
use crate::registry::{SessionId, SessionState};

use super::store::{InboxEvent, JoinOutcome, PollSnapshot, SessionRecord, SessionStore};

/// In-memory poll-mode session store
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<SessionId, SessionRecord>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records (test and stats support)
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    fn is_fresh(record: &SessionRecord, now: SystemTime, freshness: Duration) -> bool {
        match now.duration_since(record.last_active) {
            Ok(idle) => idle <= freshness,
            // last_active in the future only happens with injected clocks
            Err(_) => true,
        }
    }

    fn uncouple_and_notify(
        records: &mut HashMap<SessionId, SessionRecord>,
        partner_id: SessionId,
        now: SystemTime,
    ) {
        if let Some(partner) = records.get_mut(&partner_id) {
            partner.state = SessionState::Idle;
            partner.partner = None;
            partner.inbox.push(InboxEvent {
                event: Event::PartnerLeft,
                created_at: now,
            });
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn join(
        &self,
        id: SessionId,
        profile: Profile,
        now: SystemTime,
        freshness: Duration,
    ) -> Result<JoinOutcome> {
        let mut records = self.records.lock().await;

        // Join while matched behaves like skip: uncouple the old pair first
        let prior_partner = records
            .get(&id)
            .filter(|r| r.state == SessionState::Matched)
            .and_then(|r| r.partner);
        if let Some(pid) = prior_partner {
            Self::uncouple_and_notify(&mut records, pid, now);
        }

        match records.get_mut(&id) {
            Some(record) => {
                record.profile = profile.clone();
                record.last_active = now;
                if record.state != SessionState::Waiting {
                    record.state = SessionState::Waiting;
                    record.partner = None;
                    record.enqueued_at = now;
                }
            }
            None => {
                records.insert(id, SessionRecord::new(id, profile.clone(), now));
            }
        }

        // Earliest-enqueued fresh candidate that is mutually compatible.
        // Done under the same lock as the upsert above, so two racing
        // joins serialize: the winner claims, the loser finds no waiting
        // candidate and parks.
        let mut candidates: Vec<(SystemTime, SessionId)> = records
            .values()
            .filter(|r| {
                r.id != id
                    && r.state == SessionState::Waiting
                    && Self::is_fresh(r, now, freshness)
                    && matcher::compatible(&r.profile, &profile)
            })
            .map(|r| (r.enqueued_at, r.id))
            .collect();
        candidates.sort_by_key(|(enqueued_at, _)| *enqueued_at);

        let Some((_, candidate_id)) = candidates.into_iter().next() else {
            return Ok(JoinOutcome::Waiting);
        };

        // Later-enqueued side initiates, same rule as the push transport.
        // A fresh join always enqueued just now; only a profile refresh on
        // an older queue position can make the caller the responder.
        let caller_enqueued_at = records.get(&id).map(|r| r.enqueued_at).unwrap_or(now);
        let caller_info = PartnerInfo::from_profile(Some(id), &profile);
        let (caller_initiates, partner_info) = match records.get_mut(&candidate_id) {
            Some(candidate) => {
                let caller_initiates = caller_enqueued_at >= candidate.enqueued_at;
                candidate.state = SessionState::Matched;
                candidate.partner = Some(id);
                candidate.inbox.push(InboxEvent {
                    event: Event::Matched {
                        initiator: !caller_initiates,
                        partner: caller_info,
                    },
                    created_at: now,
                });
                (caller_initiates, candidate.partner_info())
            }
            // Candidate vanished between scan and claim cannot happen
            // under the lock; treat it as no candidate anyway.
            None => return Ok(JoinOutcome::Waiting),
        };

        if let Some(caller) = records.get_mut(&id) {
            caller.state = SessionState::Matched;
            caller.partner = Some(candidate_id);
        }

        tracing::debug!(caller = %id, partner = %candidate_id, "Poll pair claimed");
        Ok(JoinOutcome::Matched {
            initiator: caller_initiates,
            partner: partner_info,
        })
    }

    async fn poll(&self, id: SessionId, now: SystemTime) -> Result<PollSnapshot> {
        let mut records = self.records.lock().await;

        let (state, partner_id, drained) = {
            let record = records.get_mut(&id).ok_or(Error::SessionNotFound(id))?;
            record.last_active = now;
            let drained = std::mem::take(&mut record.inbox);
            (record.state, record.partner, drained)
        };

        let partner = partner_id.and_then(|pid| records.get(&pid).map(|r| r.partner_info()));

        Ok(PollSnapshot {
            state,
            partner,
            events: drained.into_iter().map(|e| e.event).collect(),
        })
    }

    async fn partner_of(&self, id: SessionId) -> Result<Option<SessionId>> {
        let records = self.records.lock().await;
        let record = records.get(&id).ok_or(Error::SessionNotFound(id))?;
        Ok(record.partner)
    }

    async fn push_event(&self, id: SessionId, event: Event, now: SystemTime) -> Result<()> {
        let mut records = self.records.lock().await;
        let record = records.get_mut(&id).ok_or(Error::SessionNotFound(id))?;

        record.inbox.push(InboxEvent {
            event,
            created_at: now,
        });
        Ok(())
    }

    async fn leave(&self, id: SessionId, now: SystemTime) -> Result<()> {
        let mut records = self.records.lock().await;

        let Some(record) = records.remove(&id) else {
            return Ok(());
        };
        if let Some(pid) = record.partner {
            Self::uncouple_and_notify(&mut records, pid, now);
        }

        tracing::debug!(session = %id, "Poll session left");
        Ok(())
    }

    async fn sweep(&self, now: SystemTime, ttl: Duration) -> Result<usize> {
        let mut records = self.records.lock().await;

        let expired: Vec<SessionId> = records
            .values()
            .filter(|r| {
                now.duration_since(r.last_active)
                    .is_ok_and(|idle| idle >= ttl)
            })
            .map(|r| r.id)
            .collect();

        for id in &expired {
            if let Some(record) = records.remove(id) {
                if let Some(pid) = record.partner {
                    Self::uncouple_and_notify(&mut records, pid, now);
                }
            }
        }

        if !expired.is_empty() {
            tracing::info!(purged = expired.len(), remaining = records.len(), "Sweep");
        }
        Ok(expired.len())
    }
}
