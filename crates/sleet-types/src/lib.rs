//! Shared domain types for Sleet.
//!
//! This crate contains the types exchanged between the dispatch core, the
//! infrastructure adapters and the HTTP layer: the inbound `Interaction`
//! model, the outbound `Response` model, configuration shapes, and the error
//! taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod config;
pub mod error;
pub mod interaction;
pub mod response;
