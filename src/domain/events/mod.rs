//! Events module - inbound envelopes, outgoing commands and the router
//! translating between them and transport frames.

mod envelope;
mod outgoing;
mod payloads;
mod router;
mod types;

pub use envelope::{EventEnvelope, InboundFrame, HEARTBEAT_FRAME};
pub use outgoing::{BrowserFingerprint, CustomField, OutgoingCommand, SendMessage};
pub use payloads::{EventPayload, PushedAccessToken};
pub use router::EventEnvelopeRouter;
pub use types::{EventObject, EventType};
