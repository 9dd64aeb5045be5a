//! Connection identity configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::domain::foundation::{AuthenticationMode, CustomerIdentity, VisitorId};

use super::error::ValidationError;

/// Brand, channel and customer identity of the session
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub brand_id: i64,

    pub channel_id: String,

    #[serde(default)]
    pub authentication_mode: AuthenticationMode,

    /// Fixed visitor id; when absent the session restores or generates one
    pub visitor_id: Option<VisitorId>,

    pub customer_id: Option<String>,
    pub customer_first_name: Option<String>,
    pub customer_last_name: Option<String>,

    /// OAuth authorization code (third-party OAuth only)
    pub authorization_code: Option<Secret<String>>,

    /// PKCE code verifier paired with the authorization code
    pub code_verifier: Option<Secret<String>>,
}

impl ConnectionConfig {
    /// Customer identity when a customer id is configured
    pub fn customer(&self) -> Option<CustomerIdentity> {
        let id = self.customer_id.as_deref().filter(|id| !id.is_empty())?;
        let mut identity = CustomerIdentity::new(id);
        identity.first_name = self.customer_first_name.clone();
        identity.last_name = self.customer_last_name.clone();
        Some(identity)
    }

    /// Validate connection configuration
    ///
    /// Third-party OAuth requires both the authorization code and the code
    /// verifier.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.brand_id <= 0 {
            return Err(ValidationError::InvalidBrandId);
        }
        if self.channel_id.is_empty() {
            return Err(ValidationError::MissingRequired("CONNECTION__CHANNEL_ID"));
        }

        if self.authentication_mode == AuthenticationMode::ThirdPartyOAuth {
            if !is_set(&self.authorization_code) {
                return Err(ValidationError::MissingRequired("CONNECTION__AUTHORIZATION_CODE"));
            }
            if !is_set(&self.code_verifier) {
                return Err(ValidationError::MissingRequired("CONNECTION__CODE_VERIFIER"));
            }
        }

        Ok(())
    }
}

fn is_set(secret: &Option<Secret<String>>) -> bool {
    secret.as_ref().is_some_and(|s| !s.expose_secret().is_empty())
}
