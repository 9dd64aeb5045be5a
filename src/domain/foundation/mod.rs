//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the expiry capability and the error
//! taxonomy that form the vocabulary of the session core.

mod auth;
mod errors;
mod expirable;
mod ids;
mod timestamp;

pub use auth::{AuthenticationMode, CustomerIdentity};
pub use errors::{ChatError, DataError};
pub use expirable::{Expirable, SAFETY_MARGIN_SECS};
pub use ids::{EventId, MessageId, ThreadId, VisitorId};
pub use timestamp::Timestamp;
