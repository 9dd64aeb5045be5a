//! Outgoing command envelopes.
//!
//! Every command travels as
//!
//! ```text
//! {"action":"chatWindowEvent","eventId":"...","payload":{
//!     "eventType":"SendMessage","brand":{"id":1},"channel":{"id":"chat_1"},
//!     "consumerIdentity":{"idOnExternalPlatform":"..."},"visitor":{"id":"..."},
//!     "data":{...}}}
//! ```

use serde::Serialize;

use crate::domain::foundation::{CustomerIdentity, EventId, MessageId, Timestamp, VisitorId};
use crate::domain::messages::{Attachment, MessageContent, MessageContentDto, Thread};

use super::EventType;

pub(super) const CHAT_WINDOW_EVENT: &str = "chatWindowEvent";

/// Custom field set on the customer or the contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomField {
    pub ident: String,
    pub value: String,
}

impl CustomField {
    pub fn new(ident: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            value: value.into(),
        }
    }
}

/// Device description attached to sent messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserFingerprint {
    pub browser: String,
    pub browser_version: String,
    pub country: String,
    pub ip: String,
    pub language: String,
    pub location: String,
    pub application_type: String,
    pub os: String,
    pub os_version: String,
    pub device_type: String,
    pub device_token: String,
}

/// Input of the send-message command.
#[derive(Debug, Clone, PartialEq)]
pub struct SendMessage {
    pub thread: Thread,
    pub message_id: MessageId,
    pub content: MessageContent,
    pub customer_fields: Vec<CustomField>,
    pub contact_fields: Vec<CustomField>,
    pub attachments: Vec<Attachment>,
    pub browser_fingerprint: BrowserFingerprint,
}

impl SendMessage {
    pub fn new(thread: Thread, content: MessageContent) -> Self {
        Self {
            thread,
            message_id: MessageId::new(),
            content,
            customer_fields: Vec::new(),
            contact_fields: Vec::new(),
            attachments: Vec::new(),
            browser_fingerprint: BrowserFingerprint::default(),
        }
    }
}

/// A command the client sends to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingCommand {
    AuthorizeCustomer {
        authorization_code: Option<String>,
        code_verifier: Option<String>,
    },
    ReconnectCustomer,
    RefreshToken,
    SendMessage(Box<SendMessage>),
    SendTranscript {
        contact_id: String,
        recipient: String,
    },
    RecoverThread {
        thread: Option<Thread>,
    },
    FetchThreadList,
    LoadThreadMetadata {
        thread: Thread,
    },
    LoadMoreMessages {
        thread: Thread,
        scroll_token: String,
        oldest_message_created_at: Timestamp,
    },
    ArchiveThread {
        thread: Thread,
    },
    MessageSeenByCustomer {
        thread: Thread,
    },
}

impl OutgoingCommand {
    pub fn event_type(&self) -> EventType {
        match self {
            OutgoingCommand::AuthorizeCustomer { .. } => EventType::AuthorizeCustomer,
            OutgoingCommand::ReconnectCustomer => EventType::ReconnectCustomer,
            OutgoingCommand::RefreshToken => EventType::RefreshToken,
            OutgoingCommand::SendMessage(_) => EventType::SendMessage,
            OutgoingCommand::SendTranscript { .. } => EventType::SendTranscript,
            OutgoingCommand::RecoverThread { .. } => EventType::RecoverThread,
            OutgoingCommand::FetchThreadList => EventType::FetchThreadList,
            OutgoingCommand::LoadThreadMetadata { .. } => EventType::LoadThreadMetadata,
            OutgoingCommand::LoadMoreMessages { .. } => EventType::LoadMoreMessages,
            OutgoingCommand::ArchiveThread { .. } => EventType::ArchiveThread,
            OutgoingCommand::MessageSeenByCustomer { .. } => EventType::MessageSeenByCustomer,
        }
    }

    /// Commands whose data carries the OAuth access token.
    pub fn carries_access_token(&self) -> bool {
        matches!(
            self,
            OutgoingCommand::ReconnectCustomer | OutgoingCommand::RefreshToken | OutgoingCommand::SendMessage(_)
        )
    }
}

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OutgoingEnvelope<'a> {
    pub action: &'static str,
    pub event_id: EventId,
    pub payload: OutgoingPayload<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OutgoingPayload<'a> {
    pub event_type: EventType,
    pub brand: BrandRef,
    pub channel: ChannelRef<'a>,
    pub consumer_identity: &'a CustomerIdentity,
    pub visitor: VisitorRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub(super) struct BrandRef {
    pub id: i64,
}

#[derive(Serialize)]
pub(super) struct ChannelRef<'a> {
    pub id: &'a str,
}

#[derive(Serialize)]
pub(super) struct VisitorRef {
    pub id: VisitorId,
}

/// `{"token": "..."}`, only ever built for a non-empty token.
#[derive(Serialize)]
pub(super) struct TokenRef<'a> {
    pub token: &'a str,
}

/// Data of the send-message command.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SendMessageEventData<'a> {
    pub thread: &'a Thread,
    pub message_content: MessageContentDto,
    pub id_on_external_platform: MessageId,
    pub customer: CustomFields<'a>,
    pub contact: CustomFields<'a>,
    pub attachments: &'a [Attachment],
    pub browser_fingerprint: &'a BrowserFingerprint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<TokenRef<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CustomFields<'a> {
    pub custom_fields: &'a [CustomField],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AccessTokenData<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<TokenRef<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AuthorizationData<'a> {
    pub authorization: Authorization<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Authorization<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<&'a str>,
}

/// Flat `(contact, recipient)` pair reshaped into the backend's schema.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SendTranscriptData<'a> {
    pub consumer_contact: ContactRef<'a>,
    pub consumer_recipients: [RecipientRef<'a>; 1],
}

#[derive(Serialize)]
pub(super) struct ContactRef<'a> {
    pub id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RecipientRef<'a> {
    pub id_on_external_platform: &'a str,
}

#[derive(Serialize)]
pub(super) struct ThreadData<'a> {
    pub thread: &'a Thread,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LoadMoreMessagesData<'a> {
    pub scroll_token: &'a str,
    pub thread: &'a Thread,
    pub oldest_message_datetime: Timestamp,
}
