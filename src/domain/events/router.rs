//! Decoding of inbound frames and encoding of outgoing commands.

use std::sync::Arc;

use crate::domain::auth::ConnectionContext;
use crate::domain::foundation::{ChatError, EventId, Expirable};
use crate::domain::messages::MessageContentDto;
use crate::domain::token::TransactionToken;

use super::envelope::RawEnvelope;
use super::outgoing::{
    AccessTokenData, Authorization, AuthorizationData, BrandRef, ChannelRef, ContactRef, CustomFields,
    LoadMoreMessagesData, OutgoingEnvelope, OutgoingPayload, RecipientRef, SendMessageEventData, SendTranscriptData,
    ThreadData, TokenRef, VisitorRef, CHAT_WINDOW_EVENT,
};
use super::{InboundFrame, OutgoingCommand, HEARTBEAT_FRAME};

/// Stateless codec between transport frames and typed events.
///
/// Borrows the current token read-only per send; never mutates it.
#[derive(Debug, Clone)]
pub struct EventEnvelopeRouter {
    context: Arc<ConnectionContext>,
}

impl EventEnvelopeRouter {
    pub fn new(context: Arc<ConnectionContext>) -> Self {
        Self { context }
    }

    /// Classifies and decodes one inbound frame.
    ///
    /// The literal heartbeat frame is recognized by exact byte match before
    /// any JSON parsing.
    ///
    /// # Errors
    ///
    /// `InvalidData` for an unparseable frame, an unknown or outbound-only
    /// `eventType`, a payload not matching its schema, or a `data.eventType`
    /// disagreeing with the outer one.
    pub fn decode(&self, bytes: &[u8]) -> Result<InboundFrame, ChatError> {
        if bytes == HEARTBEAT_FRAME.as_bytes() {
            tracing::trace!("Heartbeat frame received");
            return Ok(InboundFrame::Heartbeat);
        }

        let envelope = RawEnvelope::parse(bytes).and_then(RawEnvelope::into_envelope);
        match envelope {
            Ok(envelope) => {
                tracing::debug!(
                    event_id = %envelope.event_id,
                    event_type = %envelope.event_type,
                    "Decoded inbound event"
                );
                Ok(InboundFrame::Event(Box::new(envelope)))
            }
            Err(e) => {
                tracing::warn!(error = %e, frame_len = bytes.len(), "Failed to decode inbound frame");
                Err(e)
            }
        }
    }

    /// Heartbeat frame bytes.
    pub fn encode_heartbeat(&self) -> Vec<u8> {
        HEARTBEAT_FRAME.as_bytes().to_vec()
    }

    /// Encodes `command` into a `chatWindowEvent` envelope.
    ///
    /// The OAuth access token is embedded as `accessToken: {token}` only when
    /// the mode requires it and the token is non-empty; otherwise the
    /// container is omitted entirely.
    ///
    /// # Errors
    ///
    /// - `MissingVisitorId` without a configured visitor id
    /// - `MissingParameter("customer")` when neither the context nor `token`
    ///   supplies a customer identity
    /// - `TokenExpired` when a message or reconnect would carry a credential
    ///   from an expired token
    /// - `InvalidData` when plugin content cannot be encoded
    pub fn encode_outgoing(
        &self,
        command: &OutgoingCommand,
        token: Option<&TransactionToken>,
    ) -> Result<Vec<u8>, ChatError> {
        let context = &self.context;
        let visitor_id = context.visitor_id.ok_or(ChatError::MissingVisitorId)?;
        let consumer_identity = context
            .customer
            .as_ref()
            .or_else(|| token.and_then(|t| t.customer_identity.as_ref()))
            .ok_or_else(|| ChatError::missing_parameter("customer"))?;

        let access_token = self.guarded_access_token(command, token)?;
        let data = Self::encode_data(command, access_token)?;

        let envelope = OutgoingEnvelope {
            action: CHAT_WINDOW_EVENT,
            event_id: EventId::new(),
            payload: OutgoingPayload {
                event_type: command.event_type(),
                brand: BrandRef { id: context.brand_id },
                channel: ChannelRef {
                    id: &context.channel_id,
                },
                consumer_identity,
                visitor: VisitorRef { id: visitor_id },
                data,
            },
        };

        tracing::debug!(
            event_id = %envelope.event_id,
            event_type = %command.event_type(),
            "Encoded outgoing command"
        );
        Ok(serde_json::to_vec(&envelope)?)
    }

    fn guarded_access_token<'a>(
        &self,
        command: &OutgoingCommand,
        token: Option<&'a TransactionToken>,
    ) -> Result<Option<TokenRef<'a>>, ChatError> {
        if !command.carries_access_token() || !self.context.authentication_mode.requires_access_token() {
            return Ok(None);
        }

        let Some(token) = token else {
            return Ok(None);
        };

        if !matches!(command, OutgoingCommand::RefreshToken) && token.is_expired() {
            return Err(ChatError::TokenExpired);
        }

        Ok(token
            .access_token
            .as_ref()
            .map(|a| a.token.as_str())
            .filter(|t| !t.is_empty())
            .map(|token| TokenRef { token }))
    }

    fn encode_data(
        command: &OutgoingCommand,
        access_token: Option<TokenRef<'_>>,
    ) -> Result<Option<serde_json::Value>, ChatError> {
        let data = match command {
            OutgoingCommand::AuthorizeCustomer {
                authorization_code,
                code_verifier,
            } => {
                let authorization_code = authorization_code.as_deref().filter(|c| !c.is_empty());
                let code_verifier = code_verifier.as_deref().filter(|c| !c.is_empty());
                if authorization_code.is_none() && code_verifier.is_none() {
                    None
                } else {
                    Some(serde_json::to_value(AuthorizationData {
                        authorization: Authorization {
                            authorization_code,
                            code_verifier,
                        },
                    })?)
                }
            }
            OutgoingCommand::ReconnectCustomer | OutgoingCommand::RefreshToken => {
                access_token.map(|t| AccessTokenData { access_token: Some(t) }).map(serde_json::to_value).transpose()?
            }
            OutgoingCommand::SendMessage(message) => Some(serde_json::to_value(SendMessageEventData {
                thread: &message.thread,
                message_content: MessageContentDto::try_from(&message.content)?,
                id_on_external_platform: message.message_id,
                customer: CustomFields {
                    custom_fields: &message.customer_fields,
                },
                contact: CustomFields {
                    custom_fields: &message.contact_fields,
                },
                attachments: &message.attachments,
                browser_fingerprint: &message.browser_fingerprint,
                access_token,
            })?),
            OutgoingCommand::SendTranscript { contact_id, recipient } => {
                Some(serde_json::to_value(SendTranscriptData {
                    consumer_contact: ContactRef { id: contact_id },
                    consumer_recipients: [RecipientRef {
                        id_on_external_platform: recipient,
                    }],
                })?)
            }
            OutgoingCommand::RecoverThread { thread } => thread
                .as_ref()
                .map(|thread| serde_json::to_value(ThreadData { thread }))
                .transpose()?,
            OutgoingCommand::FetchThreadList => None,
            OutgoingCommand::LoadThreadMetadata { thread }
            | OutgoingCommand::ArchiveThread { thread }
            | OutgoingCommand::MessageSeenByCustomer { thread } => Some(serde_json::to_value(ThreadData { thread })?),
            OutgoingCommand::LoadMoreMessages {
                thread,
                scroll_token,
                oldest_message_created_at,
            } => Some(serde_json::to_value(LoadMoreMessagesData {
                scroll_token,
                thread,
                oldest_message_datetime: *oldest_message_created_at,
            })?),
        };

        Ok(data)
    }
}
