//! Token server adapters.

mod reqwest_token_endpoint;

pub use reqwest_token_endpoint::ReqwestTokenEndpoint;
