//! Push transport: delivery over per-session channels
//!
//! Each connected session owns one unbounded mpsc channel; the hub writes
//! match results and relayed traffic onto it and the connection task drains
//! it onto the socket. Delivery is fire-and-forget: no acknowledgement is
//! awaited and no backpressure is applied, matching the semantics of a
//! notification push.
//!
//! All registry state lives in process memory and is torn down when the
//! connection drops.

pub mod hub;

pub use hub::PushHub;
