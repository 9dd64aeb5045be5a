//! Authentication vocabulary shared across the core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authentication method used when establishing a chat connection.
///
/// Modes are mutually exclusive for the lifetime of a session and determine
/// the shape of the token request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthenticationMode {
    /// The client may supply its own customer identity.
    #[default]
    Anonymous,

    /// The backend generates the customer identity; the request body is empty.
    SecuredCookie,

    /// Authorization-code flow with a PKCE code verifier against a
    /// third-party OAuth provider.
    ThirdPartyOAuth,
}

impl AuthenticationMode {
    /// Whether outgoing messages must carry the OAuth access token.
    pub fn requires_access_token(&self) -> bool {
        matches!(self, AuthenticationMode::ThirdPartyOAuth)
    }
}

impl fmt::Display for AuthenticationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthenticationMode::Anonymous => "anonymous",
            AuthenticationMode::SecuredCookie => "securedCookie",
            AuthenticationMode::ThirdPartyOAuth => "thirdPartyOAuth",
        };
        write!(f, "{}", s)
    }
}

/// Identity of the customer on the external platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerIdentity {
    pub id_on_external_platform: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl CustomerIdentity {
    /// Creates an identity with only the external id.
    pub fn new(id_on_external_platform: impl Into<String>) -> Self {
        Self {
            id_on_external_platform: id_on_external_platform.into(),
            first_name: None,
            last_name: None,
        }
    }

    /// Sets first and last name.
    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }
}
