//! Inbound event payloads, selected by `eventType`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ChatError, CustomerIdentity, DataError};
use crate::domain::messages::{Agent, Message, MessageDto, Thread};

use super::EventType;

/// Access token pushed by the server over the socket.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushedAccessToken {
    pub token: String,
    pub expires_in: i64,
}

impl std::fmt::Debug for PushedAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushedAccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

// ============================================================================
// Wire data shapes
// ============================================================================

#[derive(Deserialize)]
struct MessageData {
    message: MessageDto,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoreMessagesData {
    messages: Vec<MessageDto>,
    #[serde(default)]
    scroll_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadRecoveredData {
    thread: Thread,
    #[serde(default)]
    messages: Vec<MessageDto>,
    #[serde(default)]
    inbox_assignee: Option<Agent>,
    #[serde(default)]
    scroll_token: Option<String>,
}

#[derive(Deserialize)]
struct ThreadListData {
    threads: Vec<Thread>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadMetadataData {
    #[serde(default)]
    owner_assignee: Option<Agent>,
    #[serde(default)]
    last_message: Option<MessageDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenRefreshedData {
    access_token: PushedAccessToken,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerAuthorizedData {
    consumer_identity: CustomerIdentity,
    #[serde(default)]
    access_token: Option<PushedAccessToken>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboxAssigneeData {
    #[serde(default)]
    inbox_assignee: Option<Agent>,
    #[serde(default)]
    previous_inbox_assignee: Option<Agent>,
}

// ============================================================================
// Decoded payload
// ============================================================================

/// Payload of an inbound envelope; the variant always matches the envelope's
/// `eventType`.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    MessageCreated {
        message: Message,
    },
    MessageReadChanged {
        message: Message,
    },
    MoreMessagesLoaded {
        messages: Vec<Message>,
        scroll_token: Option<String>,
    },
    ThreadRecovered {
        thread: Thread,
        messages: Vec<Message>,
        inbox_assignee: Option<Agent>,
        scroll_token: Option<String>,
    },
    ThreadListFetched {
        threads: Vec<Thread>,
    },
    ThreadMetadataLoaded {
        owner_assignee: Option<Agent>,
        last_message: Option<Message>,
    },
    TokenRefreshed {
        access_token: PushedAccessToken,
    },
    CustomerAuthorized {
        identity: CustomerIdentity,
        access_token: Option<PushedAccessToken>,
    },
    ContactInboxAssigneeChanged {
        inbox_assignee: Option<Agent>,
        previous_inbox_assignee: Option<Agent>,
    },
}

impl EventPayload {
    /// The event type this payload belongs to.
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::MessageCreated { .. } => EventType::MessageCreated,
            EventPayload::MessageReadChanged { .. } => EventType::MessageReadChanged,
            EventPayload::MoreMessagesLoaded { .. } => EventType::MoreMessagesLoaded,
            EventPayload::ThreadRecovered { .. } => EventType::ThreadRecovered,
            EventPayload::ThreadListFetched { .. } => EventType::ThreadListFetched,
            EventPayload::ThreadMetadataLoaded { .. } => EventType::ThreadMetadataLoaded,
            EventPayload::TokenRefreshed { .. } => EventType::TokenRefreshed,
            EventPayload::CustomerAuthorized { .. } => EventType::CustomerAuthorized,
            EventPayload::ContactInboxAssigneeChanged { .. } => EventType::ContactInboxAssigneeChanged,
        }
    }

    /// Decodes `data` with the schema selected by `event_type`.
    ///
    /// # Errors
    ///
    /// `InvalidData(UnsupportedEvent)` for outbound-only types,
    /// `InvalidData(Malformed)` when `data` does not fit the schema.
    pub fn decode(event_type: EventType, data: serde_json::Value) -> Result<Self, ChatError> {
        let payload = match event_type {
            EventType::MessageCreated => {
                let d: MessageData = from_data(event_type, data)?;
                EventPayload::MessageCreated { message: d.message.into() }
            }
            EventType::MessageReadChanged => {
                let d: MessageData = from_data(event_type, data)?;
                EventPayload::MessageReadChanged { message: d.message.into() }
            }
            EventType::MoreMessagesLoaded => {
                let d: MoreMessagesData = from_data(event_type, data)?;
                EventPayload::MoreMessagesLoaded {
                    messages: into_messages(d.messages),
                    scroll_token: d.scroll_token,
                }
            }
            EventType::ThreadRecovered => {
                let d: ThreadRecoveredData = from_data(event_type, data)?;
                EventPayload::ThreadRecovered {
                    thread: d.thread,
                    messages: into_messages(d.messages),
                    inbox_assignee: d.inbox_assignee,
                    scroll_token: d.scroll_token,
                }
            }
            EventType::ThreadListFetched => {
                let d: ThreadListData = from_data(event_type, data)?;
                EventPayload::ThreadListFetched { threads: d.threads }
            }
            EventType::ThreadMetadataLoaded => {
                let d: ThreadMetadataData = from_data(event_type, data)?;
                EventPayload::ThreadMetadataLoaded {
                    owner_assignee: d.owner_assignee,
                    last_message: d.last_message.map(Into::into),
                }
            }
            EventType::TokenRefreshed => {
                let d: TokenRefreshedData = from_data(event_type, data)?;
                EventPayload::TokenRefreshed {
                    access_token: d.access_token,
                }
            }
            EventType::CustomerAuthorized => {
                let d: CustomerAuthorizedData = from_data(event_type, data)?;
                EventPayload::CustomerAuthorized {
                    identity: d.consumer_identity,
                    access_token: d.access_token,
                }
            }
            EventType::ContactInboxAssigneeChanged => {
                let d: InboxAssigneeData = from_data(event_type, data)?;
                EventPayload::ContactInboxAssigneeChanged {
                    inbox_assignee: d.inbox_assignee,
                    previous_inbox_assignee: d.previous_inbox_assignee,
                }
            }
            outbound => {
                return Err(ChatError::InvalidData(DataError::UnsupportedEvent(
                    outbound.as_str().to_string(),
                )))
            }
        };

        Ok(payload)
    }
}

fn from_data<T: DeserializeOwned>(event_type: EventType, data: serde_json::Value) -> Result<T, ChatError> {
    serde_json::from_value(data).map_err(|e| ChatError::malformed(format!("{event_type} payload: {e}")))
}

fn into_messages(messages: Vec<MessageDto>) -> Vec<Message> {
    messages.into_iter().map(Into::into).collect()
}
