//! Token module - transaction token model and lifecycle.

mod lifecycle;
mod transaction_token;

pub use lifecycle::TokenLifecycle;
pub use transaction_token::{AccessToken, TransactionToken};
