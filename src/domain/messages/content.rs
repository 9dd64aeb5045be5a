//! Message content, adjacently tagged on the wire as `{type, payload}`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ChatError;

use super::plugin::PluginElement;
use super::plugin_dto::PluginElementDto;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichLinkPayload {
    pub title: String,
    pub url: String,
    pub file_name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReplyButton {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickRepliesPayload {
    pub text: String,
    #[serde(default)]
    pub buttons: Vec<QuickReplyButton>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginPayloadDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postback: Option<String>,
    pub elements: Vec<PluginElementDto>,
}

/// Wire form of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageContentDto {
    Text(TextPayload),
    Plugin(PluginPayloadDto),
    RichLink(RichLinkPayload),
    QuickReplies(QuickRepliesPayload),
}

/// Message content as exposed to callers.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(TextPayload),
    Plugin {
        postback: Option<String>,
        elements: Vec<PluginElement>,
    },
    RichLink(RichLinkPayload),
    QuickReplies(QuickRepliesPayload),
}

impl MessageContent {
    /// Plain text content without a postback.
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text(TextPayload {
            text: text.into(),
            postback: None,
        })
    }
}

impl From<MessageContentDto> for MessageContent {
    fn from(dto: MessageContentDto) -> Self {
        match dto {
            MessageContentDto::Text(payload) => MessageContent::Text(payload),
            MessageContentDto::Plugin(payload) => MessageContent::Plugin {
                postback: payload.postback,
                elements: payload.elements.into_iter().map(Into::into).collect(),
            },
            MessageContentDto::RichLink(payload) => MessageContent::RichLink(payload),
            MessageContentDto::QuickReplies(payload) => MessageContent::QuickReplies(payload),
        }
    }
}

impl TryFrom<&MessageContent> for MessageContentDto {
    type Error = ChatError;

    fn try_from(content: &MessageContent) -> Result<Self, Self::Error> {
        Ok(match content {
            MessageContent::Text(payload) => MessageContentDto::Text(payload.clone()),
            MessageContent::Plugin { postback, elements } => MessageContentDto::Plugin(PluginPayloadDto {
                postback: postback.clone(),
                elements: elements
                    .iter()
                    .map(PluginElementDto::try_from)
                    .collect::<Result<_, _>>()?,
            }),
            MessageContent::RichLink(payload) => MessageContentDto::RichLink(payload.clone()),
            MessageContent::QuickReplies(payload) => MessageContentDto::QuickReplies(payload.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_content_is_adjacently_tagged() {
        let dto = MessageContentDto::try_from(&MessageContent::text("Hello")).unwrap();
        assert_eq!(
            serde_json::to_value(&dto).unwrap(),
            json!({"type": "TEXT", "payload": {"text": "Hello"}})
        );
    }

    #[test]
    fn decodes_rich_link_content() {
        let dto: MessageContentDto = serde_json::from_value(json!({
            "type": "RICH_LINK",
            "payload": {
                "title": "Docs",
                "url": "https://example.com",
                "fileName": "preview.png",
                "mimeType": "image/png"
            }
        }))
        .unwrap();

        let MessageContent::RichLink(link) = MessageContent::from(dto) else {
            panic!("expected rich link");
        };
        assert_eq!(link.file_name, "preview.png");
    }

    #[test]
    fn decodes_plugin_content_into_domain_elements() {
        let dto: MessageContentDto = serde_json::from_value(json!({
            "type": "PLUGIN",
            "payload": {
                "postback": "pb",
                "elements": [{"type": "custom", "id": "c1", "variables": {"level": 2}}]
            }
        }))
        .unwrap();

        let MessageContent::Plugin { postback, elements } = MessageContent::from(dto) else {
            panic!("expected plugin content");
        };
        assert_eq!(postback.as_deref(), Some("pb"));
        let PluginElement::Custom(custom) = &elements[0] else {
            panic!("expected custom element");
        };
        assert_eq!(custom.variables["level"], json!(2));
    }

    #[test]
    fn unknown_content_type_fails_to_decode() {
        let value = json!({"type": "VIDEO", "payload": {}});
        assert!(serde_json::from_value::<MessageContentDto>(value).is_err());
    }
}
