//! Service endpoints of a chat environment and their derivation.
//!
//! Given only a chat-service URL such as
//! `https://channels-eu1-qa.brandembassy.com/chat`, the diagnostic logger and
//! token-server URLs are derived by dropping the last path segment and
//! swapping the `channels` host prefix:
//!
//! ```text
//! logger:       https://app-eu1-qa.brandembassy.com/logger-public
//! token server: https://digital-oauth-eu1-qa.brandembassy.com/
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

const CHANNELS_SEGMENT: &str = "channels";
const APP_SEGMENT: &str = "app";
const DIGITAL_OAUTH_SEGMENT: &str = "digital-oauth";
const LOGGER_SUFFIX: &str = "logger-public";

static LOGGER_URL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https://app[^/]+/logger-public$").expect("static regex"));

static TOKEN_SERVER_URL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https://digital-oauth[^/]+/$").expect("static regex"));

/// Endpoints used by a chat session.
///
/// Explicitly configured logger/token URLs win; otherwise they are derived
/// from the chat URL, and an empty string records a failed derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEnvironment {
    pub chat_url: String,
    pub socket_url: String,
    pub logger_url: String,
    pub token_url: String,
}

impl ChatEnvironment {
    pub fn new(
        chat_url: impl Into<String>,
        socket_url: impl Into<String>,
        logger_url: Option<String>,
        token_url: Option<String>,
    ) -> Self {
        let chat_url = chat_url.into();
        let logger_url = logger_url
            .filter(|u| !u.is_empty())
            .or_else(|| derive_logger_url(&chat_url))
            .unwrap_or_default();
        let token_url = token_url
            .filter(|u| !u.is_empty())
            .or_else(|| derive_token_server_url(&chat_url))
            .unwrap_or_default();

        Self {
            chat_url,
            socket_url: socket_url.into(),
            logger_url,
            token_url,
        }
    }

    /// Parsed token-server base URL, if one is known and well formed.
    pub fn token_server_url(&self) -> Option<Url> {
        if self.token_url.is_empty() {
            return None;
        }
        Url::parse(&self.token_url).ok()
    }
}

/// Chat URL with its last path segment removed, always ending in `/`.
fn strip_last_segment(chat_url: &str) -> Option<String> {
    let mut url = match Url::parse(chat_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(chat_url, error = %e, "Invalid chat URL");
            return None;
        }
    };

    match url.path_segments_mut() {
        Ok(mut segments) => {
            segments.pop_if_empty().pop();
        }
        Err(()) => {
            tracing::error!(chat_url, "Invalid chat URL");
            return None;
        }
    }

    let mut base = url.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Some(base)
}

/// Derives the diagnostic logger URL from a chat-service URL.
pub fn derive_logger_url(chat_url: &str) -> Option<String> {
    let candidate = strip_last_segment(chat_url)?.replace(CHANNELS_SEGMENT, APP_SEGMENT) + LOGGER_SUFFIX;

    if LOGGER_URL_SHAPE.is_match(&candidate) {
        Some(candidate)
    } else {
        tracing::error!(candidate = %candidate, "Invalid logger URL constructed from chat URL");
        None
    }
}

/// Derives the token-server base URL from a chat-service URL.
pub fn derive_token_server_url(chat_url: &str) -> Option<String> {
    let replaced = strip_last_segment(chat_url)?.replace(CHANNELS_SEGMENT, DIGITAL_OAUTH_SEGMENT);
    let candidate = format!("{}/", replaced.trim_matches('/'));

    if TOKEN_SERVER_URL_SHAPE.is_match(&candidate) {
        Some(candidate)
    } else {
        tracing::error!(candidate = %candidate, "Invalid transaction token server URL constructed from chat URL");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT_URL: &str = "https://channels-eu1-qa.brandembassy.com/chat";

    #[test]
    fn derives_logger_url() {
        assert_eq!(
            derive_logger_url(CHAT_URL).as_deref(),
            Some("https://app-eu1-qa.brandembassy.com/logger-public")
        );
    }

    #[test]
    fn derives_token_server_url() {
        assert_eq!(
            derive_token_server_url(CHAT_URL).as_deref(),
            Some("https://digital-oauth-eu1-qa.brandembassy.com/")
        );
    }

    #[test]
    fn derivation_tolerates_trailing_slash() {
        let chat_url = "https://channels-de-eu1.niceincontact.com/chat/";
        assert_eq!(
            derive_token_server_url(chat_url).as_deref(),
            Some("https://digital-oauth-de-eu1.niceincontact.com/")
        );
        assert_eq!(
            derive_logger_url(chat_url).as_deref(),
            Some("https://app-de-eu1.niceincontact.com/logger-public")
        );
    }

    #[test]
    fn derivation_rejects_hosts_without_channels_prefix() {
        assert!(derive_token_server_url("https://chat.example.com/chat").is_none());
        assert!(derive_logger_url("https://chat.example.com/chat").is_none());
    }

    #[test]
    fn derivation_rejects_plain_http() {
        assert!(derive_token_server_url("http://channels-eu1.example.com/chat").is_none());
    }

    #[test]
    fn derivation_rejects_unparseable_urls() {
        assert!(derive_token_server_url("not a url").is_none());
        assert!(derive_logger_url("mailto:someone@example.com").is_none());
    }

    #[test]
    fn environment_derives_missing_urls() {
        let env = ChatEnvironment::new(CHAT_URL, "wss://chat-gateway-eu1-qa.brandembassy.com", None, None);
        assert_eq!(env.logger_url, "https://app-eu1-qa.brandembassy.com/logger-public");
        assert_eq!(env.token_url, "https://digital-oauth-eu1-qa.brandembassy.com/");
        assert!(env.token_server_url().is_some());
    }

    #[test]
    fn environment_prefers_explicit_urls() {
        let env = ChatEnvironment::new(
            CHAT_URL,
            "wss://socket.example.com",
            Some("https://logs.example.com/in".to_string()),
            Some("https://tokens.example.com/".to_string()),
        );
        assert_eq!(env.logger_url, "https://logs.example.com/in");
        assert_eq!(env.token_url, "https://tokens.example.com/");
    }

    #[test]
    fn environment_without_derivable_token_url_has_none() {
        let env = ChatEnvironment::new("https://chat.example.com/chat", "wss://socket", None, None);
        assert!(env.token_url.is_empty());
        assert!(env.token_server_url().is_none());
    }
}
