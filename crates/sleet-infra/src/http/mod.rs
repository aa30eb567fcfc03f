//! Outbound HTTP.
//!
//! - `followup`: edits the original deferred response through the webhook API

pub mod followup;
