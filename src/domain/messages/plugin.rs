//! Plugin message elements as exposed to callers, and their mapping to and
//! from the wire form.
//!
//! The only lossy direction is domain to wire: custom `variables` hold host
//! JSON values and must fit the closed [`DynamicValue`] set.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::domain::foundation::ChatError;

use super::plugin_dto::{
    PluginContainerDto, PluginCustomDto, PluginElementDto, PluginGalleryDto, PluginSatisfactionSurveyDto,
    PluginSubElementDto,
};
use super::{DynamicValue, DynamicValueMapper};

/// Sub-elements carry no dynamic content and share the wire shape.
pub type PluginSubElement = PluginSubElementDto;

#[derive(Debug, Clone, PartialEq)]
pub struct PluginContainer {
    pub id: String,
    pub elements: Vec<PluginSubElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PluginCustom {
    pub id: String,
    pub text: Option<String>,
    pub variables: Map<String, Value>,
}

/// A server-defined rich element attached to a message.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginElement {
    Gallery(Vec<PluginElement>),
    Menu(PluginContainer),
    TextAndButtons(PluginContainer),
    QuickReplies(PluginContainer),
    SatisfactionSurvey(PluginContainer),
    Custom(PluginCustom),
}

impl From<PluginContainerDto> for PluginContainer {
    fn from(dto: PluginContainerDto) -> Self {
        Self {
            id: dto.id,
            elements: dto.elements,
        }
    }
}

impl From<&PluginContainer> for PluginContainerDto {
    fn from(container: &PluginContainer) -> Self {
        Self {
            id: container.id.clone(),
            elements: container.elements.clone(),
        }
    }
}

impl From<PluginCustomDto> for PluginCustom {
    fn from(dto: PluginCustomDto) -> Self {
        let variables = dto
            .variables
            .iter()
            .map(|(key, value)| (key.clone(), DynamicValueMapper::to_host_value(value)))
            .collect();

        Self {
            id: dto.id,
            text: dto.text,
            variables,
        }
    }
}

impl TryFrom<&PluginCustom> for PluginCustomDto {
    type Error = ChatError;

    fn try_from(custom: &PluginCustom) -> Result<Self, Self::Error> {
        let variables = custom
            .variables
            .iter()
            .map(|(key, value)| Ok((key.clone(), DynamicValueMapper::to_tagged_value(value)?)))
            .collect::<Result<HashMap<String, DynamicValue>, ChatError>>()?;

        Ok(Self {
            id: custom.id.clone(),
            text: custom.text.clone(),
            variables,
        })
    }
}

impl From<PluginElementDto> for PluginElement {
    fn from(dto: PluginElementDto) -> Self {
        match dto {
            PluginElementDto::Gallery(gallery) => {
                PluginElement::Gallery(gallery.elements.into_iter().map(Into::into).collect())
            }
            PluginElementDto::Menu(menu) => PluginElement::Menu(menu.into()),
            PluginElementDto::TextAndButtons(e) => PluginElement::TextAndButtons(e.into()),
            PluginElementDto::QuickReplies(e) => PluginElement::QuickReplies(e.into()),
            PluginElementDto::SatisfactionSurvey(survey) => PluginElement::SatisfactionSurvey(PluginContainer {
                id: survey.id,
                elements: survey.elements,
            }),
            PluginElementDto::Custom(custom) => PluginElement::Custom(custom.into()),
        }
    }
}

impl TryFrom<&PluginElement> for PluginElementDto {
    type Error = ChatError;

    fn try_from(element: &PluginElement) -> Result<Self, Self::Error> {
        Ok(match element {
            PluginElement::Gallery(elements) => PluginElementDto::Gallery(PluginGalleryDto {
                elements: elements
                    .iter()
                    .map(PluginElementDto::try_from)
                    .collect::<Result<_, _>>()?,
            }),
            PluginElement::Menu(menu) => PluginElementDto::Menu(menu.into()),
            PluginElement::TextAndButtons(e) => PluginElementDto::TextAndButtons(e.into()),
            PluginElement::QuickReplies(e) => PluginElementDto::QuickReplies(e.into()),
            PluginElement::SatisfactionSurvey(survey) => {
                PluginElementDto::SatisfactionSurvey(PluginSatisfactionSurveyDto {
                    id: survey.id.clone(),
                    elements: survey.elements.clone(),
                })
            }
            PluginElement::Custom(custom) => PluginElementDto::Custom(custom.try_into()?),
        })
    }
}
