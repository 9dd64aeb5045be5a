//! Chat Session Core - authenticated real-time session plumbing for a chat
//! client.
//!
//! This crate obtains and refreshes transaction tokens, builds the token
//! requests of each authentication flow, and translates event envelopes
//! between the wire and typed domain values.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
