//! Session registry
//!
//! Holds one record per connected identity and the waiting queue. The
//! registry is an explicit owned value: the push hub keeps one behind a
//! lock for the lifetime of the process, and unit tests build throwaway
//! instances directly.
//!
//! # Architecture
//!
//! ```text
//!                 Registry
//!        ┌──────────────────────────┐
//!        │ sessions: HashMap<Id,    │
//!        │   Session {              │
//!        │     state, profile,      │
//!        │     partner: Option<Id>  │
//!        │   }                      │
//!        │ >                        │
//!        │ queue: Vec<Id>  (FIFO)   │
//!        └──────────────────────────┘
//!              join ──► matcher::select_pair ──► both Matched
//! ```
//!
//! Partner pointers are symmetric while both ends are `Matched`; `state`
//! alone determines queue membership.

pub mod session;
pub mod store;

pub use session::{Session, SessionId, SessionState};
pub use store::Registry;
