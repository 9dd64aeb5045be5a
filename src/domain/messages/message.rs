//! Chat message, thread and attachment models.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerIdentity, MessageId, ThreadId, Timestamp};

use super::content::{MessageContent, MessageContentDto};

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    pub friendly_name: String,
    pub mime_type: String,
    pub file_name: String,
}

/// Direction of a message relative to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageDirection {
    /// Customer to agent.
    Inbound,
    /// Agent to customer.
    Outbound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seen_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: i64,
    pub first_name: String,
    pub surname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Agent {
    /// Nickname when set, otherwise first name and surname.
    pub fn full_name(&self) -> String {
        match self.nickname.as_deref() {
            Some(nickname) if !nickname.is_empty() => nickname.to_string(),
            _ => format!("{} {}", self.first_name, self.surname).trim().to_string(),
        }
    }
}

/// Thread reference as sent in outgoing envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id_on_external_platform: ThreadId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
}

impl Thread {
    pub fn new(id_on_external_platform: ThreadId) -> Self {
        Self {
            id_on_external_platform,
            thread_name: None,
        }
    }
}

/// Wire form of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id_on_external_platform: MessageId,
    pub thread_id_on_external_platform: ThreadId,
    pub message_content: MessageContentDto,
    pub created_at: Timestamp,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub direction: MessageDirection,
    #[serde(default)]
    pub user_statistics: UserStatistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_user: Option<Agent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_end_user_identity: Option<CustomerIdentity>,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub content: MessageContent,
    pub created_at: Timestamp,
    pub attachments: Vec<Attachment>,
    pub direction: MessageDirection,
    pub user_statistics: UserStatistics,
    /// Present for outbound messages.
    pub author_user: Option<Agent>,
    /// Present for inbound messages.
    pub author_end_user_identity: Option<CustomerIdentity>,
}

impl From<MessageDto> for Message {
    fn from(dto: MessageDto) -> Self {
        Self {
            id: dto.id_on_external_platform,
            thread_id: dto.thread_id_on_external_platform,
            content: dto.message_content.into(),
            created_at: dto.created_at,
            attachments: dto.attachments,
            direction: dto.direction,
            user_statistics: dto.user_statistics,
            author_user: dto.author_user,
            author_end_user_identity: dto.author_end_user_identity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_json() -> serde_json::Value {
        json!({
            "idOnExternalPlatform": "8c0b2d44-6a6f-4b0e-a5b2-0d5b7b4f9f01",
            "threadIdOnExternalPlatform": "0b5b1c62-3ad8-4f3c-9d53-1b6a4c0c7a10",
            "messageContent": {"type": "TEXT", "payload": {"text": "Hi there"}},
            "createdAt": "2024-01-15T10:30:00.000Z",
            "attachments": [{
                "url": "https://files.example.com/a.pdf",
                "friendlyName": "a.pdf",
                "mimeType": "application/pdf",
                "fileName": "a.pdf"
            }],
            "direction": "outbound",
            "userStatistics": {"seenAt": null, "readAt": "2024-01-15T10:31:00Z"},
            "authorUser": {"id": 7, "firstName": "Jane", "surname": "Agent"}
        })
    }

    #[test]
    fn decodes_outbound_message() {
        let dto: MessageDto = serde_json::from_value(message_json()).unwrap();
        let message = Message::from(dto);

        assert_eq!(message.direction, MessageDirection::Outbound);
        assert_eq!(message.content, MessageContent::text("Hi there"));
        assert_eq!(message.attachments[0].mime_type, "application/pdf");
        assert!(message.user_statistics.seen_at.is_none());
        assert!(message.user_statistics.read_at.is_some());
        assert_eq!(message.author_user.unwrap().full_name(), "Jane Agent");
    }

    #[test]
    fn message_with_invalid_date_fails() {
        let mut value = message_json();
        value["createdAt"] = json!("yesterday");
        assert!(serde_json::from_value::<MessageDto>(value).is_err());
    }

    #[test]
    fn agent_nickname_wins_over_names() {
        let agent = Agent {
            id: 1,
            first_name: "Jane".to_string(),
            surname: "Doe".to_string(),
            nickname: Some("JD".to_string()),
            image_url: None,
        };
        assert_eq!(agent.full_name(), "JD");
    }
}
