//! Crate-wide error types
//!
//! Routing misses are deliberately split across the two transports: the push
//! hub drops a message whose sender has no partner (it can race a departure),
//! while the poll service reports [`Error::PartnerGone`] so the caller can
//! return to searching. Neither is fatal; the worst outcome anywhere in this
//! crate is "must rejoin".

use crate::registry::SessionId;

/// Error type for matchmaking and relay operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Session id is unknown to the registry or store (expired or never
    /// joined). Poll clients must rejoin with a fresh identity.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// Relay target departed between lookup and delivery (poll mode).
    #[error("partner gone")]
    PartnerGone,

    /// Underlying socket or listener error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket handshake or framing error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Client sent a frame that does not parse as a known request.
    #[error("malformed request: {0}")]
    Protocol(#[from] serde_json::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
