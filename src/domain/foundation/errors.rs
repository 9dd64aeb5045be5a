//! Error types for the session core.
//!
//! `ChatError` is the single taxonomy surfaced to callers. It is `Clone` so a
//! shared in-flight token request can hand the same outcome to every waiter.

use thiserror::Error;

/// Refinement of [`ChatError::InvalidData`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("malformed data: {0}")]
    Malformed(String),

    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("discriminator mismatch: expected '{expected}', found '{actual}'")]
    DiscriminatorMismatch { expected: String, actual: String },

    #[error("unsupported event type: {0}")]
    UnsupportedEvent(String),
}

/// Errors raised by the session core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// A token request was attempted without a visitor id.
    #[error("visitor id is missing")]
    MissingVisitorId,

    /// A required request parameter was absent or empty.
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// The token endpoint answered outside 200..=299.
    #[error("transaction token request failed with status {status_code}")]
    TransactionTokenRequestFailed { status_code: u16 },

    /// Malformed frame, unsupported dynamic value or discriminator mismatch.
    #[error("invalid data: {0}")]
    InvalidData(#[from] DataError),

    /// The transport was closed abnormally by the server.
    #[error("server closed the connection with code {close_code}")]
    ServerError { close_code: u16 },

    /// Any other transport-level failure.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The credential needed for a send has expired.
    #[error("transaction token has expired")]
    TokenExpired,

    /// The caller cancelled the request or its deadline elapsed.
    #[error("request was cancelled")]
    Cancelled,
}

impl ChatError {
    /// Creates a missing parameter error.
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        ChatError::MissingParameter(name.into())
    }

    /// Creates an invalid data error for a malformed document.
    pub fn malformed(reason: impl Into<String>) -> Self {
        ChatError::InvalidData(DataError::Malformed(reason.into()))
    }

    /// Creates an invalid data error for a discriminator mismatch.
    pub fn discriminator_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        ChatError::InvalidData(DataError::DiscriminatorMismatch {
            expected: expected.into(),
            actual: actual.into(),
        })
    }

    /// Creates a protocol error wrapping a lower-level failure.
    pub fn protocol(error: impl std::fmt::Display) -> Self {
        ChatError::ProtocolError(error.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::malformed(err.to_string())
    }
}
