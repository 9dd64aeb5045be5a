//! Inbound envelope frame.

use serde::Deserialize;

use crate::domain::foundation::{ChatError, EventId, Timestamp};

use super::{EventObject, EventPayload, EventType};

/// Literal control frame exchanged to keep the connection alive.
pub const HEARTBEAT_FRAME: &str = r#"{"action":"heartbeat"}"#;

/// A decoded inbound envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub event_id: EventId,
    pub event_object: EventObject,
    pub event_type: EventType,
    pub created_at: Timestamp,
    pub payload: EventPayload,
}

/// One inbound frame, as classified by the router.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Heartbeat,
    Event(Box<EventEnvelope>),
}

/// Fixed top-level fields; `data` is decoded after dispatch on `eventType`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawEnvelope {
    pub event_id: EventId,
    pub event_object: EventObject,
    pub event_type: String,
    pub created_at: Timestamp,
    #[serde(default, alias = "payload")]
    pub data: Option<serde_json::Value>,
}

impl RawEnvelope {
    pub(super) fn parse(bytes: &[u8]) -> Result<Self, ChatError> {
        serde_json::from_slice(bytes).map_err(|e| ChatError::malformed(format!("envelope: {e}")))
    }

    /// Resolves the dispatch type and its data, rejecting a `data.eventType`
    /// that disagrees with the outer one.
    pub(super) fn into_envelope(self) -> Result<EventEnvelope, ChatError> {
        let event_type: EventType = self.event_type.parse()?;
        let data = self
            .data
            .ok_or_else(|| ChatError::malformed(format!("{event_type} envelope without data")))?;

        if let Some(inner) = data.get("eventType") {
            if inner.as_str() != Some(event_type.as_str()) {
                let actual = inner.as_str().map_or_else(|| inner.to_string(), str::to_owned);
                return Err(ChatError::discriminator_mismatch(event_type.as_str(), actual));
            }
        }

        Ok(EventEnvelope {
            event_id: self.event_id,
            event_object: self.event_object,
            event_type,
            created_at: self.created_at,
            payload: EventPayload::decode(event_type, data)?,
        })
    }
}
