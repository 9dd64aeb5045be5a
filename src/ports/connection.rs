//! Connection port - transport seam carrying raw frames.
//!
//! Opening, closing, keep-alive pings and reconnect backoff belong to the
//! implementation; the session core only sends and receives bytes.

use async_trait::async_trait;

use crate::domain::foundation::ChatError;

/// One outbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Control frame; may overtake queued application frames.
    Heartbeat(Vec<u8>),
    /// Application frame; transmitted in submission order.
    Application(Vec<u8>),
}

impl OutboundFrame {
    pub fn bytes(&self) -> &[u8] {
        match self {
            OutboundFrame::Heartbeat(bytes) | OutboundFrame::Application(bytes) => bytes,
        }
    }
}

/// Bidirectional frame transport.
///
/// # Contract
///
/// - Application frames leave in the order `send` was called
/// - A heartbeat is never queued behind pending application frames
/// - `receive` yields frames in arrival order
/// - An abnormal close by the server is `ServerError { close_code }`;
///   every other transport failure is `ProtocolError`
#[async_trait]
pub trait Connection: Send + Sync {
    async fn send(&self, frame: OutboundFrame) -> Result<(), ChatError>;

    async fn receive(&self) -> Result<Vec<u8>, ChatError>;
}
