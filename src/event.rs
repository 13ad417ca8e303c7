//! Server→client event envelope
//!
//! One tagged JSON union covers both transports: the push hub writes these
//! straight onto each session's channel, and the poll store persists them in
//! per-session inboxes until the next poll drains them. Tag names are the
//! wire vocabulary the browser client listens for (`matched`, `waiting`,
//! `offer`, `answer`, `ice-candidate`, `message`, `partner_left`).
//!
//! Signaling payloads (`offer`/`answer`/`ice-candidate`) are opaque
//! structured JSON. The relay routes them; it never inspects or validates
//! their contents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::profile::Profile;
use crate::registry::SessionId;

/// What a session learns about the peer it was matched with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerInfo {
    /// Partner session id (present on the poll wire, where the client keeps
    /// long-lived identities; omitted when not needed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SessionId>,
    /// Partner display name
    pub name: String,
    /// Partner city
    pub city: String,
    /// Partner country
    pub country: String,
}

impl PartnerInfo {
    /// Build partner info from a profile snapshot
    pub fn from_profile(id: Option<SessionId>, profile: &Profile) -> Self {
        Self {
            id,
            name: profile.name.clone(),
            city: profile.city.clone(),
            country: profile.country.clone(),
        }
    }
}

/// Kind of opaque signaling envelope relayed between matched peers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// WebRTC session description offer
    Offer,
    /// WebRTC session description answer
    Answer,
    /// ICE candidate
    #[serde(rename = "ice-candidate")]
    IceCandidate,
}

/// Event delivered to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A partner was found; `initiator` tells this side whether it sends
    /// the first signaling offer
    Matched {
        initiator: bool,
        partner: PartnerInfo,
    },
    /// No compatible partner yet; the session is parked in the queue
    Waiting,
    /// Relayed signaling offer (opaque)
    Offer { payload: Value },
    /// Relayed signaling answer (opaque)
    Answer { payload: Value },
    /// Relayed ICE candidate (opaque)
    #[serde(rename = "ice-candidate")]
    IceCandidate { payload: Value },
    /// Relayed chat text
    Message { sender: String, text: String },
    /// The matched peer skipped, disconnected, or expired
    PartnerLeft,
}

impl Event {
    /// Wrap an opaque signaling payload in the matching event variant
    pub fn signal(kind: SignalKind, payload: Value) -> Self {
        match kind {
            SignalKind::Offer => Event::Offer { payload },
            SignalKind::Answer => Event::Answer { payload },
            SignalKind::IceCandidate => Event::IceCandidate { payload },
        }
    }

    /// Wrap relayed chat text; the receiving side always sees the sender
    /// as `"partner"`, never a real identity
    pub fn chat(text: impl Into<String>) -> Self {
        Event::Message {
            sender: "partner".to_string(),
            text: text.into(),
        }
    }
}
