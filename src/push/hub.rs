//! Push transport hub
//!
//! Serializes every matchmaking mutation behind one lock, so each inbound
//! event (join, relay, skip, disconnect) runs to completion before the
//! next touches the registry. Notifications to the counterpart session are
//! sent inside the same critical section, which is what makes "both sides
//! learn about the match in the same operation" hold.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::event::{Event, PartnerInfo, SignalKind};
use crate::matcher::MatchPair;
use crate::profile::Profile;
use crate::registry::{Registry, SessionId};

struct HubInner {
    registry: Registry,
    /// Per-session delivery channels; fire-and-forget senders
    outboxes: HashMap<SessionId, mpsc::UnboundedSender<Event>>,
}

impl HubInner {
    /// Deliver an event, ignoring channels whose receiver is gone
    fn deliver(&self, id: SessionId, event: Event) {
        if let Some(tx) = self.outboxes.get(&id) {
            let _ = tx.send(event);
        }
    }

    /// Deliver `Matched` to both sides of a fresh pair
    fn announce_pair(&self, pair: &MatchPair) {
        let responder_info = self
            .registry
            .get(pair.responder)
            .map(|s| PartnerInfo::from_profile(Some(s.id), &s.profile));
        let initiator_info = self
            .registry
            .get(pair.initiator)
            .map(|s| PartnerInfo::from_profile(Some(s.id), &s.profile));

        if let (Some(responder_info), Some(initiator_info)) = (responder_info, initiator_info) {
            self.deliver(
                pair.initiator,
                Event::Matched {
                    initiator: true,
                    partner: responder_info,
                },
            );
            self.deliver(
                pair.responder,
                Event::Matched {
                    initiator: false,
                    partner: initiator_info,
                },
            );
        }
    }
}

/// Matchmaking hub for the push transport
///
/// One hub per server process; connection handlers hold it behind an `Arc`
/// and call into it for every client request.
pub struct PushHub {
    inner: Mutex<HubInner>,
}

impl PushHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HubInner {
                registry: Registry::new(),
                outboxes: HashMap::new(),
            }),
        }
    }

    /// Register a new connection
    ///
    /// Returns the session id and the receiving end of its event channel.
    /// The session starts `Idle`; it enters the pool on its first
    /// [`PushHub::start_chat`].
    pub async fn connect(&self) -> (SessionId, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().await;

        let id = inner.registry.add();
        inner.outboxes.insert(id, tx);

        tracing::info!(session = %id, sessions = inner.registry.len(), "Session connected");
        (id, rx)
    }

    /// Enter the pool and attempt an immediate match
    ///
    /// On success both sides receive `Matched`; otherwise the caller
    /// receives `Waiting`. A caller that is already matched is uncoupled
    /// first, exactly as if it had skipped.
    pub async fn start_chat(&self, id: SessionId, profile: Profile) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if inner.registry.partner_of(id).is_some() {
            if let Some(orphan) = inner.registry.reset(id)? {
                inner.deliver(orphan, Event::PartnerLeft);
            }
        }

        match inner.registry.join(id, profile)? {
            Some(pair) => {
                tracing::info!(
                    responder = %pair.responder,
                    initiator = %pair.initiator,
                    "Matched"
                );
                inner.announce_pair(&pair);
            }
            None => {
                tracing::debug!(session = %id, waiting = inner.registry.waiting_count(), "Waiting");
                inner.deliver(id, Event::Waiting);
            }
        }

        Ok(())
    }

    /// Relay an opaque signaling envelope to the sender's partner
    ///
    /// A sender with no partner is not an error; the message is dropped
    /// silently since it can race the partner's departure.
    pub async fn signal(&self, from: SessionId, kind: SignalKind, payload: Value) -> Result<()> {
        let inner = self.inner.lock().await;

        if inner.registry.get(from).is_none() {
            return Err(Error::SessionNotFound(from));
        }

        match inner.registry.partner_of(from) {
            Some(partner) => inner.deliver(partner, Event::signal(kind, payload)),
            None => tracing::trace!(session = %from, ?kind, "Signal dropped, no partner"),
        }

        Ok(())
    }

    /// Relay chat text to the sender's partner (same drop semantics)
    pub async fn chat(&self, from: SessionId, text: String) -> Result<()> {
        let inner = self.inner.lock().await;

        if inner.registry.get(from).is_none() {
            return Err(Error::SessionNotFound(from));
        }

        match inner.registry.partner_of(from) {
            Some(partner) => inner.deliver(partner, Event::chat(text)),
            None => tracing::trace!(session = %from, "Chat dropped, no partner"),
        }

        Ok(())
    }

    /// Skip the current partner and search again with a fresh profile
    ///
    /// The former partner receives exactly one `PartnerLeft` and goes back
    /// to `Idle` without being re-queued; the caller is reset and rejoins
    /// immediately, so a compatible waiting session pairs with it in the
    /// same call.
    pub async fn next(&self, id: SessionId, profile: Profile) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if let Some(orphan) = inner.registry.reset(id)? {
            tracing::info!(session = %id, partner = %orphan, "Partner skipped");
            inner.deliver(orphan, Event::PartnerLeft);
        }

        match inner.registry.join(id, profile)? {
            Some(pair) => inner.announce_pair(&pair),
            None => inner.deliver(id, Event::Waiting),
        }

        Ok(())
    }

    /// Remove a session on connection teardown
    ///
    /// An orphaned partner receives `PartnerLeft` and is never re-queued;
    /// whether it searches again is the client's decision.
    pub async fn disconnect(&self, id: SessionId) {
        let mut inner = self.inner.lock().await;

        inner.outboxes.remove(&id);
        if let Some(orphan) = inner.registry.remove(id) {
            inner.deliver(orphan, Event::PartnerLeft);
        }

        tracing::info!(session = %id, sessions = inner.registry.len(), "Session disconnected");
    }

    /// Number of registered sessions
    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.registry.len()
    }
}

impl Default for PushHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ANY;
    use serde_json::json;

    fn expect_matched(event: Event) -> (bool, PartnerInfo) {
        match event {
            Event::Matched { initiator, partner } => (initiator, partner),
            other => panic!("expected Matched, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_then_match_notifies_both_sides() {
        let hub = PushHub::new();
        let (a, mut rx_a) = hub.connect().await;
        let (b, mut rx_b) = hub.connect().await;

        hub.start_chat(a, Profile::seeking("male", ANY)).await.unwrap();
        assert_eq!(rx_a.try_recv().unwrap(), Event::Waiting);

        hub.start_chat(b, Profile::seeking("female", "male"))
            .await
            .unwrap();

        let (a_initiates, a_partner) = expect_matched(rx_a.try_recv().unwrap());
        let (b_initiates, b_partner) = expect_matched(rx_b.try_recv().unwrap());

        // the joiner whose request triggered the match initiates
        assert!(!a_initiates);
        assert!(b_initiates);
        assert_eq!(a_partner.id, Some(b));
        assert_eq!(b_partner.id, Some(a));
    }

    #[tokio::test]
    async fn test_incompatible_pair_both_wait() {
        let hub = PushHub::new();
        let (a, mut rx_a) = hub.connect().await;
        let (c, mut rx_c) = hub.connect().await;

        hub.start_chat(a, Profile::seeking("male", "female"))
            .await
            .unwrap();
        hub.start_chat(c, Profile::seeking("male", "male"))
            .await
            .unwrap();

        assert_eq!(rx_a.try_recv().unwrap(), Event::Waiting);
        assert_eq!(rx_c.try_recv().unwrap(), Event::Waiting);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_signal_routed_to_partner_only() {
        let hub = PushHub::new();
        let (a, mut rx_a) = hub.connect().await;
        let (b, mut rx_b) = hub.connect().await;

        hub.start_chat(a, Profile::default()).await.unwrap();
        hub.start_chat(b, Profile::default()).await.unwrap();
        rx_a.try_recv().unwrap(); // waiting
        rx_a.try_recv().unwrap(); // matched
        rx_b.try_recv().unwrap(); // matched

        hub.signal(a, SignalKind::Offer, json!({"sdp": "v=0"}))
            .await
            .unwrap();

        assert_eq!(
            rx_b.try_recv().unwrap(),
            Event::Offer {
                payload: json!({"sdp": "v=0"})
            }
        );
        // nothing echoed back to the sender
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_signal_without_partner_is_dropped() {
        let hub = PushHub::new();
        let (a, mut rx_a) = hub.connect().await;

        // not matched; relay succeeds but delivers nothing
        hub.signal(a, SignalKind::IceCandidate, json!({"candidate": "c0"}))
            .await
            .unwrap();
        hub.chat(a, "hello?".into()).await.unwrap();

        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_chat_masks_sender_identity() {
        let hub = PushHub::new();
        let (a, mut rx_a) = hub.connect().await;
        let (b, mut rx_b) = hub.connect().await;

        hub.start_chat(a, Profile::default()).await.unwrap();
        hub.start_chat(b, Profile::default()).await.unwrap();
        rx_a.try_recv().unwrap();
        rx_a.try_recv().unwrap();
        rx_b.try_recv().unwrap();

        hub.chat(b, "hi".into()).await.unwrap();
        assert_eq!(
            rx_a.try_recv().unwrap(),
            Event::Message {
                sender: "partner".into(),
                text: "hi".into()
            }
        );
    }

    #[tokio::test]
    async fn test_skip_notifies_partner_exactly_once_and_rematches() {
        let hub = PushHub::new();
        let (a, mut rx_a) = hub.connect().await;
        let (b, mut rx_b) = hub.connect().await;
        let (d, mut rx_d) = hub.connect().await;

        hub.start_chat(a, Profile::seeking("male", ANY)).await.unwrap();
        hub.start_chat(b, Profile::seeking("female", "male"))
            .await
            .unwrap();
        // d is waiting for a female partner
        hub.start_chat(d, Profile::seeking("male", "female"))
            .await
            .unwrap();
        rx_a.try_recv().unwrap(); // waiting
        rx_a.try_recv().unwrap(); // matched
        rx_b.try_recv().unwrap(); // matched
        rx_d.try_recv().unwrap(); // waiting

        // a skips with a new profile compatible with d
        hub.next(a, Profile::seeking("female", ANY)).await.unwrap();

        // b got exactly one partner_left and nothing else
        assert_eq!(rx_b.try_recv().unwrap(), Event::PartnerLeft);
        assert!(rx_b.try_recv().is_err());

        // a and d were paired synchronously with the skip
        let (a_initiates, a_partner) = expect_matched(rx_a.try_recv().unwrap());
        let (d_initiates, d_partner) = expect_matched(rx_d.try_recv().unwrap());
        assert!(a_initiates);
        assert!(!d_initiates);
        assert_eq!(a_partner.id, Some(d));
        assert_eq!(d_partner.id, Some(a));
        assert_eq!(a_partner.name, "Stranger");
    }

    #[tokio::test]
    async fn test_skip_without_match_waits() {
        let hub = PushHub::new();
        let (a, mut rx_a) = hub.connect().await;
        let (b, mut rx_b) = hub.connect().await;

        hub.start_chat(a, Profile::default()).await.unwrap();
        hub.start_chat(b, Profile::default()).await.unwrap();
        rx_a.try_recv().unwrap();
        rx_a.try_recv().unwrap();
        rx_b.try_recv().unwrap();

        hub.next(a, Profile::default()).await.unwrap();

        assert_eq!(rx_b.try_recv().unwrap(), Event::PartnerLeft);
        // b is idle, not re-queued, so a keeps waiting
        assert_eq!(rx_a.try_recv().unwrap(), Event::Waiting);
        assert_eq!(hub.inner.lock().await.registry.waiting_count(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_notifies_partner_without_requeue() {
        let hub = PushHub::new();
        let (a, _rx_a) = hub.connect().await;
        let (b, mut rx_b) = hub.connect().await;

        hub.start_chat(a, Profile::default()).await.unwrap();
        hub.start_chat(b, Profile::default()).await.unwrap();
        rx_b.try_recv().unwrap();

        hub.disconnect(a).await;

        assert_eq!(rx_b.try_recv().unwrap(), Event::PartnerLeft);
        assert_eq!(hub.session_count().await, 1);
        assert_eq!(hub.inner.lock().await.registry.waiting_count(), 0);
    }

    #[tokio::test]
    async fn test_message_racing_disconnect_is_dropped() {
        let hub = PushHub::new();
        let (a, _rx_a) = hub.connect().await;
        let (b, mut rx_b) = hub.connect().await;

        hub.start_chat(a, Profile::default()).await.unwrap();
        hub.start_chat(b, Profile::default()).await.unwrap();
        rx_b.try_recv().unwrap();

        hub.disconnect(a).await;
        rx_b.try_recv().unwrap(); // partner_left

        // b's in-flight message finds no partner; silently dropped
        hub.chat(b, "still there?".into()).await.unwrap();
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_start_chat_while_matched_acts_as_skip() {
        let hub = PushHub::new();
        let (a, mut rx_a) = hub.connect().await;
        let (b, mut rx_b) = hub.connect().await;

        hub.start_chat(a, Profile::default()).await.unwrap();
        hub.start_chat(b, Profile::default()).await.unwrap();
        rx_a.try_recv().unwrap();
        rx_a.try_recv().unwrap();
        rx_b.try_recv().unwrap();

        // a searches again without skipping first
        hub.start_chat(a, Profile::default()).await.unwrap();

        assert_eq!(rx_b.try_recv().unwrap(), Event::PartnerLeft);
        assert_eq!(rx_a.try_recv().unwrap(), Event::Waiting);
    }

    #[tokio::test]
    async fn test_unknown_session_is_an_error() {
        let hub = PushHub::new();
        let ghost = SessionId::generate();

        let result = hub.signal(ghost, SignalKind::Offer, json!({})).await;
        assert!(matches!(result, Err(Error::SessionNotFound(_))));
    }
}
