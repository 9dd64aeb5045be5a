//! In-process `Connection` over tokio channels.
//!
//! `ChannelConnection::pair` returns the session side and the transport side.
//! The transport side is driven by whatever owns the real socket (or by a
//! test): it pulls outbound frames with [`ChannelTransport::next_outbound`]
//! and pushes inbound frames with [`ChannelTransport::deliver`].
//!
//! Outbound frames travel in two lanes. Heartbeats use an unbounded control
//! lane that `next_outbound` always drains first, so a heartbeat never waits
//! behind queued application frames.

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::domain::foundation::ChatError;
use crate::ports::{Connection, OutboundFrame};

/// Session side of an in-process connection.
pub struct ChannelConnection {
    control_tx: mpsc::UnboundedSender<Vec<u8>>,
    data_tx: mpsc::Sender<Vec<u8>>,
    inbound_rx: Mutex<mpsc::Receiver<Result<Vec<u8>, ChatError>>>,
}

/// Transport side of an in-process connection.
pub struct ChannelTransport {
    control_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    data_rx: mpsc::Receiver<Vec<u8>>,
    inbound_tx: mpsc::Sender<Result<Vec<u8>, ChatError>>,
}

impl ChannelConnection {
    /// Creates a connected pair; `capacity` bounds each direction's
    /// application queue.
    pub fn pair(capacity: usize) -> (ChannelConnection, ChannelTransport) {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (data_tx, data_rx) = mpsc::channel(capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);

        (
            ChannelConnection {
                control_tx,
                data_tx,
                inbound_rx: Mutex::new(inbound_rx),
            },
            ChannelTransport {
                control_rx,
                data_rx,
                inbound_tx,
            },
        )
    }
}

fn closed() -> ChatError {
    ChatError::protocol("connection closed")
}

#[async_trait]
impl Connection for ChannelConnection {
    async fn send(&self, frame: OutboundFrame) -> Result<(), ChatError> {
        match frame {
            OutboundFrame::Heartbeat(bytes) => self.control_tx.send(bytes).map_err(|_| closed()),
            OutboundFrame::Application(bytes) => self.data_tx.send(bytes).await.map_err(|_| closed()),
        }
    }

    async fn receive(&self) -> Result<Vec<u8>, ChatError> {
        let mut inbound = self.inbound_rx.lock().await;
        inbound.recv().await.unwrap_or_else(|| Err(closed()))
    }
}

impl ChannelTransport {
    /// Next frame to put on the wire, control frames first. `None` once the
    /// session side is gone and both lanes are drained.
    pub async fn next_outbound(&mut self) -> Option<OutboundFrame> {
        tokio::select! {
            biased;

            Some(bytes) = self.control_rx.recv() => Some(OutboundFrame::Heartbeat(bytes)),
            Some(bytes) = self.data_rx.recv() => Some(OutboundFrame::Application(bytes)),
            else => None,
        }
    }

    /// Delivers one inbound frame to the session side.
    pub async fn deliver(&self, bytes: impl Into<Vec<u8>>) -> Result<(), ChatError> {
        self.inbound_tx.send(Ok(bytes.into())).await.map_err(|_| closed())
    }

    /// Reports an abnormal close by the server.
    pub async fn close_with(&self, close_code: u16) -> Result<(), ChatError> {
        tracing::debug!(close_code, "Server closed connection");
        self.inbound_tx
            .send(Err(ChatError::ServerError { close_code }))
            .await
            .map_err(|_| closed())
    }
}
