//! Anonymous 1:1 matchmaking and WebRTC signaling relay
//!
//! Pairs anonymous sessions by mutual gender/preference compatibility and
//! relays chat and opaque WebRTC signaling between matched peers. The same
//! matchmaking contract is served over two transports:
//!
//! - **Push** ([`push::PushHub`] behind [`server::SignalingServer`]): state
//!   lives in process memory for the lifetime of a WebSocket connection;
//!   match results and relayed traffic are delivered immediately over a
//!   per-session channel.
//! - **Poll** ([`poll::PollService`] over a [`poll::SessionStore`]): for
//!   environments without durable connections; sessions are short-lived
//!   store records with inbox queues, drained by the client at its own
//!   cadence and expired by heartbeat TTL.
//!
//! # Architecture
//!
//! ```text
//!   WebSocket clients                 Polling clients
//!         │                                 │
//!   SignalingServer                    PollService<S>
//!         │                                 │
//!      PushHub ──► Registry           SessionStore (trait)
//!         │      (map + queue)             │
//!   mpsc channels                     MemoryStore / external
//!         │                                 │
//!         └────── matcher::select_pair ─────┘
//!              (one policy, both transports)
//! ```
//!
//! The matching policy is a deterministic greedy earliest-compatible-pair
//! scan over the waiting set; the later-enqueued side of every pair sends
//! the first signaling offer. Signaling payloads are opaque JSON; the
//! relay routes them to the sender's current partner and nowhere else.
//!
//! # Example
//!
//! ```no_run
//! use roulette_rs::{ServerConfig, SignalingServer};
//!
//! #[tokio::main]
//! async fn main() -> roulette_rs::Result<()> {
//!     let config = ServerConfig::default().max_connections(1000);
//!     SignalingServer::new(config).run().await
//! }
//! ```

pub mod error;
pub mod event;
pub mod matcher;
pub mod poll;
pub mod profile;
pub mod push;
pub mod registry;
pub mod server;

pub use error::{Error, Result};
pub use event::{Event, PartnerInfo, SignalKind};
pub use poll::{MemoryStore, PollConfig, PollService, SessionStore};
pub use profile::Profile;
pub use push::PushHub;
pub use registry::{Registry, SessionId, SessionState};
pub use server::{ServerConfig, SignalingServer};
