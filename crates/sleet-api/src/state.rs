//! Application state wiring the dispatch engine together.
//!
//! AppState pins the core's ports to the concrete infra implementations:
//! `Ed25519Verifier` for inbound signatures and `HttpFollowupTransport` for
//! follow-ups.

use std::sync::Arc;

use sleet_core::defer::DeferredTaskManager;
use sleet_core::dispatch::DispatchEngine;
use sleet_core::handler::ClientContext;
use sleet_core::notify::WebhookNotifier;
use sleet_core::registry::CallbackRegistry;
use sleet_infra::config::Settings;
use sleet_infra::http::followup::HttpFollowupTransport;

use crate::builtin::register_builtin;

/// Shared state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DispatchEngine>,
}

impl AppState {
    pub fn new(engine: DispatchEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Wire the engine from resolved settings, with the built-in handlers
    /// registered.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let registry = Arc::new(CallbackRegistry::new());
        register_builtin(&registry)?;

        let transport = HttpFollowupTransport::new(
            settings.api_base_url.clone(),
            settings.application_id.clone(),
            settings.bot_token.clone(),
        )?;
        let context = ClientContext::new(
            settings.application_id.as_str(),
            WebhookNotifier::new(transport),
        );

        let engine = DispatchEngine::new(
            Arc::new(settings.verifier.clone()),
            registry,
            DeferredTaskManager::new(settings.auto_defer),
            context,
        )
        .with_payload_logging(settings.debug);

        Ok(Self::new(engine))
    }
}
