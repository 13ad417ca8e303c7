//! Poll transport: delivery over a shared session store
//!
//! For environments without durable duplex connections: every session is a
//! short-lived record with an inbox queue, and each API call (join, poll,
//! signal, leave) is an independent transaction against the store. Match
//! results and relayed traffic reach the remote side by being written into
//! its inbox, which the client drains on its next poll.
//!
//! Semantics are deliberately identical to the push transport (same
//! matching policy, same initiator rule, same skip/disconnect behavior);
//! the only differences are delivery latency (next poll instead of
//! immediate) and heartbeat-based expiry instead of connection teardown.

pub mod config;
pub mod memory;
pub mod service;
pub mod store;

pub use config::PollConfig;
pub use memory::MemoryStore;
pub use service::{JoinResponse, PollService};
pub use store::{InboxEvent, JoinOutcome, PollSnapshot, SessionRecord, SessionStore};
