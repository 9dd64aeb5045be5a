//! Ports - Interfaces for external dependencies.
//!
//! - `KeyValueStore` - Typed persistence of session state
//! - `TokenEndpoint` - HTTP POST to the transaction token server
//! - `Connection` - Frame transport to the chat backend

mod connection;
mod key_value_store;
mod token_endpoint;

pub use connection::{Connection, OutboundFrame};
pub use key_value_store::{KeyValueStore, KeyValueStoreExt, StoreError, StoreKey};
pub use token_endpoint::{HttpReply, TokenEndpoint};
