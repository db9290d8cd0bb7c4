// libs/signaling-cell/src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of frame kinds the relay understands. Anything else fails
/// to parse and is dropped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Join,
    Offer,
    Answer,
    IceCandidate,
    ChatMessage,
}

impl SignalKind {
    /// Kinds that are fanned out to the other members of the sender's room.
    pub fn is_relayed(&self) -> bool {
        !matches!(self, SignalKind::Join)
    }
}

/// A signaling frame as sent over the wire: `{type, roomId?, payload?}`.
///
/// The relay parses frames only to dispatch on the kind; the original text
/// is forwarded verbatim so extra fields survive the hop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalFrame {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    #[serde(rename = "roomId", skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}
