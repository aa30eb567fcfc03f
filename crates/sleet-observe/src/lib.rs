//! Observability setup for Sleet.

pub mod tracing_setup;
