//! Application layer - session orchestration over the domain and ports.
//!
//! `TransactionTokenService` owns token acquisition; `ChatSession` drives a
//! connection with it.

mod chat_session;
mod token_service;

pub use chat_session::ChatSession;
pub use token_service::TransactionTokenService;
