//! Dispatch core for Sleet.
//!
//! Classifies verified interactions, resolves them against the callback
//! registry, runs handlers as independent tasks, and upgrades slow handlers
//! into deferred responses whose result is delivered by the webhook notifier.
//!
//! This crate defines the ports the infrastructure layer implements
//! (`RequestVerifier`, `FollowupTransport`). It depends only on
//! `sleet-types` -- never on `sleet-infra` or any HTTP/crypto crate.

pub mod args;
pub mod classify;
pub mod defer;
pub mod dispatch;
pub mod handler;
pub mod notify;
pub mod registry;
pub mod verify;

pub use classify::{Route, RouteKind, classify};
pub use defer::DeferredTaskManager;
pub use dispatch::{DispatchEngine, DispatchError, DispatchOutcome, DispatchState, InboundRequest};
pub use handler::{ClientContext, DeferredResponse, Handler, Reply};
pub use notify::{FollowupTransport, WebhookNotifier};
pub use registry::CallbackRegistry;
pub use verify::RequestVerifier;
