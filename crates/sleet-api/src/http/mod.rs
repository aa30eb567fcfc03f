//! HTTP layer for Sleet.
//!
//! Axum-based webhook endpoint: `POST /` receives signed interactions,
//! `GET /health` reports liveness.

pub mod error;
pub mod handlers;
pub mod router;
