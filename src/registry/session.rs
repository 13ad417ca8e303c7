//! Session identity, state machine, and the per-session record
//!
//! A session is the server-side view of one participant. Its `state` fully
//! determines membership elsewhere: `Waiting` means it is in the queue,
//! `Matched` means it holds a partner pointer, `Idle` means neither.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profile::Profile;

/// Opaque session identifier
///
/// Stable for the lifetime of a connection (push transport) or poll
/// identity (poll transport). Both transports share this type so partner
/// pointers and wire payloads look the same everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Matchmaking state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Just created or just left a pair; not seeking
    Idle,
    /// Enqueued, waiting for a compatible partner
    Waiting,
    /// Paired; `partner` is set
    Matched,
}

/// In-memory session record (push transport)
#[derive(Debug, Clone)]
pub struct Session {
    /// Session id
    pub id: SessionId,

    /// Current matchmaking state
    pub state: SessionState,

    /// Profile snapshot, rewritten on every join/skip request
    pub profile: Profile,

    /// Currently matched peer, if any. Symmetric while both ends are
    /// `Matched`: if `a.partner == Some(b)` then `b.partner == Some(a)`.
    pub partner: Option<SessionId>,
}

impl Session {
    /// Create a fresh idle session with a placeholder profile
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: SessionState::Idle,
            profile: Profile::default(),
            partner: None,
        }
    }

    /// Reset to the just-connected state, dropping pairing and profile
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.profile = Profile::default();
        self.partner = None;
    }

    /// Enter the queue with a fresh profile snapshot
    pub fn start_waiting(&mut self, profile: Profile) {
        self.state = SessionState::Waiting;
        self.profile = profile;
        self.partner = None;
    }

    /// Leave a pair and return to idle
    pub fn uncouple(&mut self) {
        self.state = SessionState::Idle;
        self.partner = None;
    }

    /// Check whether the session is currently seeking a partner
    pub fn is_waiting(&self) -> bool {
        self.state == SessionState::Waiting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let id = SessionId::generate();
        let mut session = Session::new(id);

        assert_eq!(session.state, SessionState::Idle);
        assert!(session.partner.is_none());

        session.start_waiting(Profile::seeking("male", "any"));
        assert!(session.is_waiting());
        assert_eq!(session.profile.gender, "male");

        let partner = SessionId::generate();
        session.state = SessionState::Matched;
        session.partner = Some(partner);

        session.uncouple();
        assert_eq!(session.state, SessionState::Idle);
        assert!(session.partner.is_none());
        // profile snapshot survives uncoupling; only reset clears it
        assert_eq!(session.profile.gender, "male");

        session.reset();
        assert_eq!(session.profile, Profile::default());
    }

    #[test]
    fn test_session_id_parse_roundtrip() {
        let id = SessionId::generate();
        let parsed: SessionId = id.to_string().parse().unwrap();

        assert_eq!(parsed, id);
    }
}
