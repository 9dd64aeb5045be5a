//! Owned per-session connection configuration.

use secrecy::{ExposeSecret, Secret};

use crate::domain::foundation::{AuthenticationMode, CustomerIdentity, VisitorId};

use super::{ChatEnvironment, PkcePair};

/// Identifiers and credentials describing one chat session.
///
/// Built once (usually from `ChatConfig::connection_context`) and handed to
/// each component at construction; components never consult global state.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub brand_id: i64,
    pub channel_id: String,
    pub authentication_mode: AuthenticationMode,
    pub visitor_id: Option<VisitorId>,
    pub customer: Option<CustomerIdentity>,
    pub environment: ChatEnvironment,
    authorization_code: Option<Secret<String>>,
    code_verifier: Option<Secret<String>>,
}

impl ConnectionContext {
    pub fn new(
        brand_id: i64,
        channel_id: impl Into<String>,
        authentication_mode: AuthenticationMode,
        environment: ChatEnvironment,
    ) -> Self {
        Self {
            brand_id,
            channel_id: channel_id.into(),
            authentication_mode,
            visitor_id: None,
            customer: None,
            environment,
            authorization_code: None,
            code_verifier: None,
        }
    }

    pub fn with_visitor_id(mut self, visitor_id: VisitorId) -> Self {
        self.visitor_id = Some(visitor_id);
        self
    }

    pub fn with_customer(mut self, customer: CustomerIdentity) -> Self {
        self.customer = Some(customer);
        self
    }

    /// Sets the authorization code and PKCE code verifier of the OAuth flow.
    pub fn with_oauth_code(mut self, authorization_code: impl Into<String>, code_verifier: impl Into<String>) -> Self {
        self.authorization_code = Some(Secret::new(authorization_code.into()));
        self.code_verifier = Some(Secret::new(code_verifier.into()));
        self
    }

    /// Sets the authorization code returned by the OAuth provider together
    /// with the verifier of the PKCE pair whose challenge started the login.
    pub fn with_pkce(mut self, authorization_code: impl Into<String>, pkce: &PkcePair) -> Self {
        self.authorization_code = Some(Secret::new(authorization_code.into()));
        self.code_verifier = Some(Secret::new(pkce.verifier().to_owned()));
        self
    }

    pub(crate) fn set_oauth_secrets(
        &mut self,
        authorization_code: Option<Secret<String>>,
        code_verifier: Option<Secret<String>>,
    ) {
        self.authorization_code = authorization_code;
        self.code_verifier = code_verifier;
    }

    /// Authorization code, `None` when absent or empty.
    pub fn authorization_code(&self) -> Option<&str> {
        non_empty(&self.authorization_code)
    }

    /// PKCE code verifier, `None` when absent or empty.
    pub fn code_verifier(&self) -> Option<&str> {
        non_empty(&self.code_verifier)
    }
}

fn non_empty(secret: &Option<Secret<String>>) -> Option<&str> {
    secret
        .as_ref()
        .map(|s| s.expose_secret().as_str())
        .filter(|s| !s.is_empty())
}
