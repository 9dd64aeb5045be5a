//! Transaction token returned by the token endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ChatError, CustomerIdentity, Expirable, Timestamp};

/// OAuth access token pair, present only in the third-party OAuth flow.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub token: String,
    pub refresh_token: String,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Decodes the body of a refresh response.
    pub fn from_response(body: &[u8]) -> Result<Self, ChatError> {
        let token: AccessToken = serde_json::from_slice(body)?;
        if token.token.is_empty() {
            return Err(ChatError::malformed("refresh response carries an empty token"));
        }
        Ok(token)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Short-lived credential exchanged for WebSocket-level authorization.
///
/// Wire document:
/// `{accessToken, expiresIn, customerIdentity?, thirdParty?, createdDate?}`.
/// A missing `createdDate` defaults to the moment of decoding.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionToken {
    /// The token value used for WebSocket authentication.
    #[serde(rename = "accessToken")]
    pub value: String,

    /// Lifetime in seconds, typically around 600.
    pub expires_in: i64,

    #[serde(default = "Timestamp::now")]
    pub created_date: Timestamp,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_identity: Option<CustomerIdentity>,

    /// Third-party OAuth access token, only in the OAuth flow.
    #[serde(rename = "thirdParty", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<AccessToken>,
}

impl TransactionToken {
    pub fn new(value: impl Into<String>, expires_in: i64) -> Self {
        Self {
            value: value.into(),
            expires_in,
            created_date: Timestamp::now(),
            customer_identity: None,
            access_token: None,
        }
    }

    pub fn with_created_date(mut self, created_date: Timestamp) -> Self {
        self.created_date = created_date;
        self
    }

    pub fn with_customer_identity(mut self, identity: CustomerIdentity) -> Self {
        self.customer_identity = Some(identity);
        self
    }

    pub fn with_access_token(mut self, access_token: AccessToken) -> Self {
        self.access_token = Some(access_token);
        self
    }

    /// Decodes and validates a token endpoint response body.
    ///
    /// An empty token value or a non-positive lifetime is `InvalidData`.
    pub fn from_response(body: &[u8]) -> Result<Self, ChatError> {
        let token: TransactionToken = serde_json::from_slice(body)?;
        token.validate()?;
        Ok(token)
    }

    /// Checks the structural invariants of the token.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.value.is_empty() {
            return Err(ChatError::malformed("token response carries an empty accessToken"));
        }
        if self.expires_in <= 0 {
            return Err(ChatError::malformed(format!(
                "token response carries a non-positive expiresIn ({})",
                self.expires_in
            )));
        }
        Ok(())
    }

    /// Copy of this token carrying a refreshed OAuth access token.
    pub fn copy_with_access_token(&self, access_token: AccessToken) -> Self {
        Self {
            access_token: Some(access_token),
            ..self.clone()
        }
    }

    /// Refresh token of the OAuth pair, if any.
    pub fn refresh_token(&self) -> Option<&str> {
        self.access_token
            .as_ref()
            .map(|t| t.refresh_token.as_str())
            .filter(|t| !t.is_empty())
    }
}

impl Expirable for TransactionToken {
    fn expires_in(&self) -> i64 {
        self.expires_in
    }

    fn created_date(&self) -> Timestamp {
        self.created_date
    }
}

impl fmt::Debug for TransactionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionToken")
            .field("value", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("created_date", &self.created_date)
            .field("customer_identity", &self.customer_identity)
            .field("access_token", &self.access_token)
            .finish()
    }
}
