//! Wire form of plugin message elements.
//!
//! Every element is a JSON object whose `type` field names its kind:
//!
//! ```text
//! {"type":"menu","id":"m1","elements":[{"type":"button","id":"b1","text":"Yes"}]}
//! {"type":"gallery","elements":[{"type":"menu",...},{"type":"custom",...}]}
//! ```
//!
//! The `type` field selects the variant on decode and is re-emitted on
//! encode. An unknown or missing `type` fails the whole element.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::DynamicValue;

// ============================================================================
// Sub-elements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginTextDto {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginButtonDto {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_in_app: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginFileDto {
    pub id: String,
    pub url: String,
    pub file_name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginTitleDto {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PluginSubElementDto {
    Text(PluginTextDto),
    Button(PluginButtonDto),
    File(PluginFileDto),
    Title(PluginTitleDto),
}

// ============================================================================
// Containers
// ============================================================================

/// Shared shape of menu, text-and-buttons, quick-replies and
/// satisfaction-survey elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginContainerDto {
    pub id: String,
    pub elements: Vec<PluginSubElementDto>,
}

pub type PluginMenuDto = PluginContainerDto;
pub type PluginTextAndButtonsDto = PluginContainerDto;
pub type PluginQuickRepliesDto = PluginContainerDto;

/// Satisfaction survey: `{id, type:"satisfactionSurvey", elements:[...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSatisfactionSurveyDto {
    pub id: String,
    pub elements: Vec<PluginSubElementDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginGalleryDto {
    pub elements: Vec<PluginElementDto>,
}

/// Element whose `variables` subtree is defined by the plugin author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginCustomDto {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub variables: HashMap<String, DynamicValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PluginElementDto {
    Gallery(PluginGalleryDto),
    Menu(PluginMenuDto),
    TextAndButtons(PluginTextAndButtonsDto),
    QuickReplies(PluginQuickRepliesDto),
    SatisfactionSurvey(PluginSatisfactionSurveyDto),
    Custom(PluginCustomDto),
}
