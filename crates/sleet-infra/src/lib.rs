//! Infrastructure layer for Sleet.
//!
//! Contains implementations of the ports defined in `sleet-core`:
//! Ed25519 request verification, the follow-up webhook HTTP transport, and
//! the TOML configuration loader.

pub mod config;
pub mod crypto;
pub mod http;
