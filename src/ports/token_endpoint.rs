//! TokenEndpoint port - HTTP seam for the transaction token server.

use async_trait::async_trait;

use crate::domain::auth::TokenRequest;
use crate::domain::foundation::ChatError;

/// Raw HTTP reply of the token server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for statuses in `200..=299`.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Sends a built [`TokenRequest`] and returns the raw reply.
///
/// # Contract
///
/// - Any received HTTP reply, whatever its status, is `Ok`; status
///   interpretation belongs to the caller
/// - Transport failures (connect, timeout, TLS) are `ProtocolError`
/// - No retries
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    async fn post(&self, request: &TokenRequest) -> Result<HttpReply, ChatError>;
}
