//! Messages module - message content, plugin elements and dynamic values.

mod content;
mod dynamic;
mod message;
mod plugin;
pub mod plugin_dto;

pub use content::{
    MessageContent, MessageContentDto, PluginPayloadDto, QuickReplyButton, QuickRepliesPayload, RichLinkPayload,
    TextPayload,
};
pub use dynamic::{DynamicValue, DynamicValueMapper};
pub use message::{Agent, Attachment, Message, MessageDirection, MessageDto, Thread, UserStatistics};
pub use plugin::{PluginContainer, PluginCustom, PluginElement, PluginSubElement};
pub use plugin_dto::PluginElementDto;
