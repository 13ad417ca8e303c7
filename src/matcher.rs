//! Matching engine
//!
//! Pure pair selection over an ordered snapshot of the waiting set. The
//! policy is greedy earliest-compatible-pair: take the earliest-enqueued
//! waiting session, scan forward for the first later session that is
//! mutually compatible, and pair them; if none accepts it, move on to the
//! next. This does not maximize total pairs or minimize wait, but it is
//! deterministic for a fixed queue order, which both transports rely on.
//!
//! # Initiator convention
//!
//! Exactly one side of a pair sends the first signaling offer. The rule,
//! applied uniformly across both transports: the *later-enqueued* member of
//! the pair initiates. In the common case that is the session whose join
//! triggered the match; the exception is a profile refresh on an older
//! queue position enabling a match with someone who enqueued afterwards,
//! where the refresher stays the responder.

use crate::profile::Profile;
use crate::registry::SessionId;

/// Mutual compatibility predicate
///
/// Both sides must accept the other's gender; `"any"` is a wildcard on
/// either side. A session is never compatible with itself.
pub fn compatible(a: &Profile, b: &Profile) -> bool {
    a.accepts(b) && b.accepts(a)
}

/// One waiting session as seen by the selector
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Session id
    pub id: SessionId,
    /// Profile snapshot captured at enqueue time
    pub profile: &'a Profile,
}

/// A selected pair, split by the initiator convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPair {
    /// Earlier-enqueued side; waits to receive the offer
    pub responder: SessionId,
    /// Later-enqueued side; sends the first signaling offer
    pub initiator: SessionId,
}

/// Select at most one pair from the waiting set
///
/// `candidates` must be the live waiting sessions in enqueue order (stale
/// ids already pruned by the caller). Returns `None` for fewer than two
/// candidates or when no two are mutually compatible.
pub fn select_pair(candidates: &[Candidate<'_>]) -> Option<MatchPair> {
    if candidates.len() < 2 {
        return None;
    }

    for (i, first) in candidates.iter().enumerate() {
        for second in &candidates[i + 1..] {
            if first.id == second.id {
                continue;
            }
            if compatible(first.profile, second.profile) {
                return Some(MatchPair {
                    responder: first.id,
                    initiator: second.id,
                });
            }
        }
    }

    None
}
