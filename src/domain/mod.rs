//! Domain layer containing the session core's types and rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (errors, IDs, timestamps, auth vocabulary)
//! - `token` - Transaction token model and its lifecycle
//! - `auth` - Connection context, endpoint derivation, token request building
//! - `messages` - Message content, plugin element tree, dynamic values
//! - `events` - Event envelopes, inbound payloads, outgoing commands

pub mod auth;
pub mod events;
pub mod foundation;
pub mod messages;
pub mod token;
