//! Connection adapters.

mod channel_connection;

pub use channel_connection::{ChannelConnection, ChannelTransport};
