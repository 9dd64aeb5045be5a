//! Service endpoint configuration

use serde::Deserialize;

use crate::domain::auth::ChatEnvironment;

use super::error::ValidationError;

/// Chat service endpoints
///
/// Logger and token URLs are derived from `chat_url` unless set explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    pub chat_url: String,

    pub socket_url: String,

    pub logger_url: Option<String>,

    pub token_url: Option<String>,
}

impl EnvironmentConfig {
    /// Resolve into the endpoints used by a session
    pub fn to_environment(&self) -> ChatEnvironment {
        ChatEnvironment::new(
            self.chat_url.clone(),
            self.socket_url.clone(),
            self.logger_url.clone(),
            self.token_url.clone(),
        )
    }

    /// Validate endpoint configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.chat_url.is_empty() {
            return Err(ValidationError::MissingRequired("ENVIRONMENT__CHAT_URL"));
        }
        if !self.chat_url.starts_with("https://") {
            return Err(ValidationError::UrlMustBeHttps("Chat URL"));
        }
        if !self.socket_url.starts_with("wss://") {
            return Err(ValidationError::SocketUrlMustBeSecure);
        }
        if let Some(url) = self.token_url.as_deref().filter(|u| !u.is_empty()) {
            if !url.starts_with("https://") {
                return Err(ValidationError::UrlMustBeHttps("Token URL"));
            }
        }
        if self.to_environment().token_server_url().is_none() {
            return Err(ValidationError::MissingRequired("ENVIRONMENT__TOKEN_URL"));
        }
        Ok(())
    }
}
