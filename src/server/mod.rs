//! WebSocket front-end for the push transport
//!
//! Accept loop, per-connection tasks, and the JSON wire protocol. The
//! matchmaking semantics live in [`crate::push`]; this module only moves
//! frames between sockets and the hub.

pub mod config;
pub mod listener;
pub mod protocol;

pub use config::ServerConfig;
pub use listener::SignalingServer;
pub use protocol::ClientRequest;
