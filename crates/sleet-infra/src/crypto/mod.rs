//! Cryptographic operations for Sleet.
//!
//! - `signature`: Ed25519 verification of inbound interaction requests

pub mod signature;
