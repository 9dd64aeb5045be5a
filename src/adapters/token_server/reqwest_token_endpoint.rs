//! reqwest-backed token endpoint.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

use crate::domain::auth::TokenRequest;
use crate::domain::foundation::ChatError;
use crate::ports::{HttpReply, TokenEndpoint};

/// Posts token requests over HTTPS with a per-request timeout.
#[derive(Debug, Clone)]
pub struct ReqwestTokenEndpoint {
    client: Client,
    timeout: Duration,
}

impl ReqwestTokenEndpoint {
    /// Creates an endpoint whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::protocol(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl TokenEndpoint for ReqwestTokenEndpoint {
    async fn post(&self, request: &TokenRequest) -> Result<HttpReply, ChatError> {
        let body = request.body_bytes()?;

        tracing::debug!(url = %request.url.path(), "Posting transaction token request");

        let response = self
            .client
            .post(request.url.clone())
            .header(CONTENT_TYPE, TokenRequest::CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::protocol(format!("token request timed out after {}s", self.timeout.as_secs()))
                } else if e.is_connect() {
                    ChatError::protocol(format!("Connection failed: {e}"))
                } else {
                    ChatError::protocol(e)
                }
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(ChatError::protocol)?.to_vec();

        tracing::debug!(status, "Token endpoint replied");
        Ok(HttpReply { status, body })
    }
}
