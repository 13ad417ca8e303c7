//! Client→server request envelope
//!
//! JSON text frames tagged by `type`, matching the vocabulary the browser
//! client emits: `start_chat`, `next`, `offer`, `answer`, `ice-candidate`,
//! `message`. Profile fields ride flattened next to the tag on join/skip
//! requests, with placeholder defaults for anything omitted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::SignalKind;
use crate::profile::Profile;

/// A parsed client request frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Enter the pool with a fresh profile snapshot
    StartChat {
        #[serde(flatten)]
        profile: Profile,
    },
    /// Skip the current partner and search again
    Next {
        #[serde(flatten)]
        profile: Profile,
    },
    /// Opaque signaling offer for the current partner
    Offer { payload: Value },
    /// Opaque signaling answer for the current partner
    Answer { payload: Value },
    /// Opaque ICE candidate for the current partner
    #[serde(rename = "ice-candidate")]
    IceCandidate { payload: Value },
    /// Chat text for the current partner
    Message { text: String },
}

impl ClientRequest {
    /// The signaling kind of this request, if it is a signaling envelope
    pub fn signal_kind(&self) -> Option<SignalKind> {
        match self {
            ClientRequest::Offer { .. } => Some(SignalKind::Offer),
            ClientRequest::Answer { .. } => Some(SignalKind::Answer),
            ClientRequest::IceCandidate { .. } => Some(SignalKind::IceCandidate),
            _ => None,
        }
    }
}
