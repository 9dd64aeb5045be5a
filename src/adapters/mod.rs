//! Adapters - Implementations of port interfaces.
//!
//! - `storage` - In-memory and file-backed key-value stores
//! - `token_server` - reqwest client for the transaction token endpoint
//! - `connection` - Channel-backed frame transport with a heartbeat lane

pub mod connection;
pub mod storage;
pub mod token_server;

pub use connection::{ChannelConnection, ChannelTransport};
pub use storage::{FileKeyValueStore, InMemoryKeyValueStore};
pub use token_server::ReqwestTokenEndpoint;
