//! Poll transport service
//!
//! Stateless request handlers over a [`SessionStore`]: every call is an
//! independent transaction, and the caller's identity is whatever session
//! id it presents. Activity timestamps are refreshed on every request;
//! sessions that stop calling are reaped by the background sweeper rather
//! than told to stop.

use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::event::{Event, SignalKind};
use crate::profile::Profile;
use crate::registry::SessionId;

use super::config::PollConfig;
use super::store::{JoinOutcome, PollSnapshot, SessionStore};

/// Response to a join request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinResponse {
    /// The caller's poll identity; allocated on first join, echoed back
    /// on refreshes. The client presents it on every subsequent call.
    pub session_id: SessionId,
    /// Immediate match or parked waiting
    #[serde(flatten)]
    pub outcome: JoinOutcome,
}

/// Matchmaking service for the poll transport
pub struct PollService<S: SessionStore> {
    store: S,
    config: PollConfig,
}

impl<S: SessionStore> PollService<S> {
    /// Create a service over a store with default timing
    pub fn new(store: S) -> Self {
        Self::with_config(store, PollConfig::default())
    }

    /// Create a service with custom timing
    pub fn with_config(store: S, config: PollConfig) -> Self {
        Self { store, config }
    }

    /// Get the service configuration
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Access the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Enter the pool, allocating a fresh identity when none is presented
    ///
    /// An immediate `Matched` outcome means this caller claimed an
    /// already-waiting partner, who finds out on its next poll; the
    /// outcome's `initiator` flag says which side sends the first offer.
    /// A caller that was matched is uncoupled first, exactly as if it had
    /// skipped.
    pub async fn join(&self, id: Option<SessionId>, profile: Profile) -> Result<JoinResponse> {
        let session_id = id.unwrap_or_else(SessionId::generate);
        let outcome = self
            .store
            .join(
                session_id,
                profile,
                SystemTime::now(),
                self.config.freshness_window,
            )
            .await?;

        match &outcome {
            JoinOutcome::Waiting => tracing::debug!(session = %session_id, "Join: waiting"),
            JoinOutcome::Matched { .. } => tracing::info!(session = %session_id, "Join: matched"),
        }

        Ok(JoinResponse {
            session_id,
            outcome,
        })
    }

    /// Drain the caller's inbox and report its current pairing state
    pub async fn poll(&self, id: SessionId) -> Result<PollSnapshot> {
        self.store.poll(id, SystemTime::now()).await
    }

    /// Relay an opaque signaling envelope to the caller's partner
    ///
    /// Unlike the push transport, a missing partner is reported: the
    /// caller is polling anyway and can react by searching again.
    pub async fn signal(&self, from: SessionId, kind: SignalKind, payload: Value) -> Result<()> {
        self.relay(from, Event::signal(kind, payload)).await
    }

    /// Relay chat text to the caller's partner
    pub async fn chat(&self, from: SessionId, text: String) -> Result<()> {
        self.relay(from, Event::chat(text)).await
    }

    async fn relay(&self, from: SessionId, event: Event) -> Result<()> {
        let partner = self
            .store
            .partner_of(from)
            .await?
            .ok_or(Error::PartnerGone)?;

        match self.store.push_event(partner, event, SystemTime::now()).await {
            Ok(()) => Ok(()),
            // partner record expired between lookup and append
            Err(Error::SessionNotFound(_)) => Err(Error::PartnerGone),
            Err(e) => Err(e),
        }
    }

    /// Leave the pool and notify a remaining partner
    pub async fn leave(&self, id: SessionId) -> Result<()> {
        self.store.leave(id, SystemTime::now()).await
    }

    /// Purge expired records once
    pub async fn sweep(&self) -> Result<usize> {
        self.store
            .sweep(SystemTime::now(), self.config.session_ttl)
            .await
    }
}

impl<S: SessionStore + 'static> PollService<S> {
    /// Spawn the background sweeper
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        let interval = service.config.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = service.sweep().await {
                    tracing::error!(error = %e, "Sweep failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::memory::MemoryStore;
    use crate::profile::ANY;
    use crate::registry::SessionState;
    use serde_json::json;

    fn service() -> PollService<MemoryStore> {
        PollService::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn test_join_allocates_identity() {
        let service = service();

        let response = service.join(None, Profile::default()).await.unwrap();
        assert_eq!(response.outcome, JoinOutcome::Waiting);

        // the echoed identity is live in the store
        let snapshot = service.poll(response.session_id).await.unwrap();
        assert_eq!(snapshot.state, SessionState::Waiting);
    }

    #[tokio::test]
    async fn test_second_join_matches_immediately() {
        let service = service();

        let x = service
            .join(None, Profile::seeking("male", ANY))
            .await
            .unwrap();
        let y = service
            .join(None, Profile::seeking("female", "male"))
            .await
            .unwrap();

        // the caller gets the match in its own response and initiates
        let JoinOutcome::Matched { initiator, partner } = &y.outcome else {
            panic!("expected immediate match");
        };
        assert!(initiator);
        assert_eq!(partner.id, Some(x.session_id));

        // the waiting side gets it from the inbox, not from its join call
        let snapshot = service.poll(x.session_id).await.unwrap();
        assert!(matches!(
            snapshot.events.as_slice(),
            [Event::Matched {
                initiator: false,
                ..
            }]
        ));
    }

    #[tokio::test]
    async fn test_signal_reaches_partner_inbox() {
        let service = service();

        let x = service.join(None, Profile::default()).await.unwrap();
        let y = service.join(None, Profile::default()).await.unwrap();

        service
            .signal(y.session_id, SignalKind::Offer, json!({"sdp": "v=0"}))
            .await
            .unwrap();
        service
            .chat(y.session_id, "hello".into())
            .await
            .unwrap();

        let snapshot = service.poll(x.session_id).await.unwrap();
        // matched event first, then the relayed traffic in order
        assert_eq!(snapshot.events.len(), 3);
        assert!(matches!(snapshot.events[1], Event::Offer { .. }));
        assert_eq!(snapshot.events[2], Event::chat("hello"));
    }

    #[tokio::test]
    async fn test_signal_without_partner_reports_gone() {
        let service = service();

        let x = service.join(None, Profile::default()).await.unwrap();
        let result = service
            .signal(x.session_id, SignalKind::Answer, json!({}))
            .await;

        assert!(matches!(result, Err(Error::PartnerGone)));
    }

    #[tokio::test]
    async fn test_signal_from_unknown_session() {
        let service = service();
        let ghost = SessionId::generate();

        let result = service.signal(ghost, SignalKind::Offer, json!({})).await;
        assert!(matches!(result, Err(Error::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_leave_then_signal_reports_gone() {
        let service = service();

        let x = service.join(None, Profile::default()).await.unwrap();
        let y = service.join(None, Profile::default()).await.unwrap();

        service.leave(x.session_id).await.unwrap();

        // y still holds no partner pointer after the leave uncoupled it
        let result = service
            .signal(y.session_id, SignalKind::Offer, json!({}))
            .await;
        assert!(matches!(result, Err(Error::PartnerGone)));

        let snapshot = service.poll(y.session_id).await.unwrap();
        assert_eq!(snapshot.state, SessionState::Idle);
        assert_eq!(snapshot.events.last(), Some(&Event::PartnerLeft));
    }

    #[tokio::test]
    async fn test_join_response_wire_shape() {
        let service = service();

        let response = service.join(None, Profile::default()).await.unwrap();
        let value = serde_json::to_value(&response).unwrap();

        // outcome flattened beside the id
        assert_eq!(value["status"], "waiting");
        assert!(value["session_id"].is_string());
    }
}
