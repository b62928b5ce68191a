//! Wire format of the push-update channel.
//!
//! Every inbound text frame is a JSON object tagged by `type`. Only
//! `spot.update` frames carry state; everything else is dropped by the
//! channel reader.

use serde::{Deserialize, Serialize};

use crate::record::SpotRecord;

/// Tag of the only frame type the channel acts on.
pub const SPOT_UPDATE: &str = "spot.update";

/// A spot-update event carrying one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UpdateEvent {
    #[serde(rename = "spot.update")]
    SpotUpdate { payload: SpotRecord },
}

impl UpdateEvent {
    pub fn spot_update(payload: SpotRecord) -> Self {
        UpdateEvent::SpotUpdate { payload }
    }

    pub fn payload(&self) -> &SpotRecord {
        match self {
            UpdateEvent::SpotUpdate { payload } => payload,
        }
    }

    pub fn into_payload(self) -> SpotRecord {
        match self {
            UpdateEvent::SpotUpdate { payload } => payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDecodeError {
    /// Frame is not a JSON object.
    Malformed(String),
    MissingType,
    UnexpectedType(String),
    /// Tagged `spot.update` but the payload is not a spot record.
    InvalidPayload(String),
}

impl std::fmt::Display for MessageDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageDecodeError::Malformed(msg) => write!(f, "malformed frame: {msg}"),
            MessageDecodeError::MissingType => write!(f, "frame has no type tag"),
            MessageDecodeError::UnexpectedType(ty) => write!(f, "unexpected frame type: {ty}"),
            MessageDecodeError::InvalidPayload(msg) => write!(f, "invalid spot payload: {msg}"),
        }
    }
}

impl std::error::Error for MessageDecodeError {}

/// Decode one text frame from the update channel.
pub fn decode_frame(text: &str) -> Result<UpdateEvent, MessageDecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| MessageDecodeError::Malformed(e.to_string()))?;
    let Some(obj) = value.as_object() else {
        return Err(MessageDecodeError::Malformed("not a JSON object".to_string()));
    };

    match obj.get("type").and_then(|t| t.as_str()) {
        None => return Err(MessageDecodeError::MissingType),
        Some(SPOT_UPDATE) => {}
        Some(other) => return Err(MessageDecodeError::UnexpectedType(other.to_string())),
    }
    serde_json::from_value::<UpdateEvent>(value)
        .map_err(|e| MessageDecodeError::InvalidPayload(e.to_string()))
}

pub fn encode_event(event: &UpdateEvent) -> String {
    // Cannot fail: serde_json writes non-finite floats as null.
    serde_json::to_string(event).unwrap_or_default()
}
