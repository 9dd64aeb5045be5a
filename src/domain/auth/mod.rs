//! Auth module - connection context, environment endpoints and token request
//! construction.

mod builder;
mod context;
mod environment;
mod pkce;

pub use builder::{AuthFlowBuilder, TokenRequest};
pub use context::ConnectionContext;
pub use environment::{derive_logger_url, derive_token_server_url, ChatEnvironment};
pub use pkce::{challenge_for, PkcePair, CHALLENGE_METHOD};
