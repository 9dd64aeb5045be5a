//! Construction of token endpoint requests per authentication mode.
//!
//! | Mode            | Body                                                                                  |
//! |-----------------|---------------------------------------------------------------------------------------|
//! | Anonymous       | `{"type":"anonymous","customerIdentity"?:{"idOnExternalPlatform"}}`                    |
//! | SecuredCookie   | `{}`                                                                                  |
//! | ThirdPartyOAuth | `{"thirdParty":{"grant_type":"authorization_code","authorization_code","code_verifier"}}` |
//! | refresh         | `{"thirdParty":{"grant_type":"refresh_token","refresh_token"}}`                         |
//!
//! All requests are `POST <token-server>/oauth/token?channelId=&brandId=&visitorId=`
//! with a JSON body. Every validation failure is raised here, before any
//! network call exists.

use reqwest::Url;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::domain::foundation::{AuthenticationMode, ChatError};
use crate::domain::token::TransactionToken;

use super::ConnectionContext;

const TOKEN_PATH: &str = "oauth/token";

/// A fully built, not yet sent, token endpoint request.
#[derive(Clone, PartialEq)]
pub struct TokenRequest {
    pub url: Url,
    pub body: serde_json::Value,
}

impl TokenRequest {
    pub const METHOD: &'static str = "POST";
    pub const CONTENT_TYPE: &'static str = "application/json";

    /// Serialized JSON body.
    pub fn body_bytes(&self) -> Result<Vec<u8>, ChatError> {
        Ok(serde_json::to_vec(&self.body)?)
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The body carries authorization codes and refresh tokens.
        f.debug_struct("TokenRequest")
            .field("method", &Self::METHOD)
            .field("url", &self.url.as_str())
            .field("body", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
struct AnonymousBody<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "customerIdentity", skip_serializing_if = "Option::is_none")]
    customer_identity: Option<ExternalIdentity<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExternalIdentity<'a> {
    id_on_external_platform: &'a str,
}

#[derive(Serialize)]
struct ThirdPartyBody<'a> {
    #[serde(rename = "thirdParty")]
    third_party: ThirdPartyGrant<'a>,
}

#[derive(Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
enum ThirdPartyGrant<'a> {
    AuthorizationCode {
        authorization_code: &'a str,
        code_verifier: &'a str,
    },
    RefreshToken {
        refresh_token: &'a str,
    },
}

/// Stateless builder of token requests; a pure function of the context and
/// the requested mode.
#[derive(Debug, Clone)]
pub struct AuthFlowBuilder {
    context: Arc<ConnectionContext>,
}

impl AuthFlowBuilder {
    pub fn new(context: Arc<ConnectionContext>) -> Self {
        Self { context }
    }

    /// Builds the initial token request for `mode`.
    ///
    /// # Errors
    ///
    /// - `MissingVisitorId` / `MissingParameter("tokenServerUrl")` from URL construction
    /// - `MissingParameter("authorizationCode")` or `("codeVerifier")` for
    ///   ThirdPartyOAuth when either is absent or empty
    pub fn build_token_request(&self, mode: AuthenticationMode) -> Result<TokenRequest, ChatError> {
        let url = self.token_url()?;

        let body = match mode {
            AuthenticationMode::SecuredCookie => serde_json::Value::Object(serde_json::Map::new()),
            AuthenticationMode::Anonymous => serde_json::to_value(AnonymousBody {
                kind: "anonymous",
                customer_identity: self.context.customer.as_ref().map(|c| ExternalIdentity {
                    id_on_external_platform: &c.id_on_external_platform,
                }),
            })?,
            AuthenticationMode::ThirdPartyOAuth => {
                let authorization_code = self
                    .context
                    .authorization_code()
                    .ok_or_else(|| ChatError::missing_parameter("authorizationCode"))?;
                let code_verifier = self
                    .context
                    .code_verifier()
                    .ok_or_else(|| ChatError::missing_parameter("codeVerifier"))?;

                serde_json::to_value(ThirdPartyBody {
                    third_party: ThirdPartyGrant::AuthorizationCode {
                        authorization_code,
                        code_verifier,
                    },
                })?
            }
        };

        Ok(TokenRequest { url, body })
    }

    /// Builds the OAuth refresh request from the stored refresh token.
    ///
    /// # Errors
    ///
    /// `MissingParameter("refreshToken")` when `current` carries no refresh
    /// token, plus the URL construction errors of [`Self::token_url`].
    pub fn build_refresh_request(&self, current: Option<&TransactionToken>) -> Result<TokenRequest, ChatError> {
        let url = self.token_url()?;

        let refresh_token = current
            .and_then(TransactionToken::refresh_token)
            .ok_or_else(|| ChatError::missing_parameter("refreshToken"))?;

        let body = serde_json::to_value(ThirdPartyBody {
            third_party: ThirdPartyGrant::RefreshToken { refresh_token },
        })?;

        Ok(TokenRequest { url, body })
    }

    /// `<token-server>/oauth/token` with `channelId`, `brandId` and `visitorId`.
    pub fn token_url(&self) -> Result<Url, ChatError> {
        let visitor_id = self.context.visitor_id.ok_or(ChatError::MissingVisitorId)?;

        let mut base = self
            .context
            .environment
            .token_server_url()
            .ok_or_else(|| ChatError::missing_parameter("tokenServerUrl"))?;

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut url = base
            .join(TOKEN_PATH)
            .map_err(|_| ChatError::missing_parameter("urlWithPath"))?;

        url.query_pairs_mut()
            .append_pair("channelId", &self.context.channel_id)
            .append_pair("brandId", &self.context.brand_id.to_string())
            .append_pair("visitorId", &visitor_id.to_string());

        Ok(url)
    }
}
