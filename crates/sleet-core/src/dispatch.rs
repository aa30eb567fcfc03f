//! DispatchEngine -- the per-request state machine.
//!
//! For each inbound request:
//! 1. verify the signature (failure is terminal, nothing else runs)
//! 2. parse and classify the interaction
//! 3. answer pings directly, without touching the registry
//! 4. resolve the handler (miss -> not found)
//! 5. start the handler as its own task
//! 6. race it against the auto-defer timeout (commands and components only)
//! 7. emit exactly one primary response; deferred work is handed to the
//!    `DeferredTaskManager`, which delivers its result as a follow-up once
//!    the caller releases it after sending the primary response
//!
//! Every request runs inside an `interaction` span carrying a UUIDv7
//! request id.

use std::sync::Arc;

use thiserror::Error;
use tracing::{Instrument, Span, debug, error, field, info, info_span, warn};
use uuid::Uuid;

use sleet_types::error::AuthError;
use sleet_types::interaction::Interaction;
use sleet_types::response::Response;

use crate::classify::{Route, RouteKind, classify};
use crate::defer::{DeferredTaskManager, FollowupRelease};
use crate::handler::{ClientContext, Reply};
use crate::registry::CallbackRegistry;
use crate::verify::RequestVerifier;

/// Raw request as seen by the engine: signature headers plus the exact body.
#[derive(Debug, Clone, Copy)]
pub struct InboundRequest<'a> {
    pub timestamp: Option<&'a str>,
    /// Hex-encoded signature.
    pub signature: Option<&'a str>,
    pub body: &'a [u8],
}

/// Failures after a handler was resolved.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A second primary response was attempted for one interaction.
    #[error("interaction already responded to")]
    AlreadyResponded,

    #[error("handler failed: {0:#}")]
    Handler(anyhow::Error),

    /// The handler task panicked or was cancelled.
    #[error("handler task aborted: {0}")]
    HandlerAborted(String),
}

/// Lifecycle states of one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Verified,
    Classified,
    HandlerResolved,
    Invoked,
    RespondedImmediate,
    RespondedDeferred,
    FollowedUp,
    Unauthorized,
    Malformed,
    NotFound,
    AlreadyResponded,
    Failed,
}

impl DispatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Verified => "verified",
            Self::Classified => "classified",
            Self::HandlerResolved => "handler_resolved",
            Self::Invoked => "invoked",
            Self::RespondedImmediate => "responded_immediate",
            Self::RespondedDeferred => "responded_deferred",
            Self::FollowedUp => "followed_up",
            Self::Unauthorized => "unauthorized",
            Self::Malformed => "malformed",
            Self::NotFound => "not_found",
            Self::AlreadyResponded => "already_responded",
            Self::Failed => "failed",
        }
    }
}

/// Terminal result of dispatching one request.
#[derive(Debug)]
pub enum DispatchOutcome {
    Unauthorized,
    /// The body passed verification but is not a valid interaction.
    Malformed(String),
    NotFound,
    /// A primary response was produced. `followup` is set when a follow-up
    /// is pending in the background; release it once `response` is sent.
    Responded {
        response: Response,
        followup: Option<FollowupRelease>,
    },
    Failed(DispatchError),
}

impl DispatchOutcome {
    pub fn state(&self) -> DispatchState {
        match self {
            Self::Unauthorized => DispatchState::Unauthorized,
            Self::Malformed(_) => DispatchState::Malformed,
            Self::NotFound => DispatchState::NotFound,
            Self::Responded { followup: None, .. } => DispatchState::RespondedImmediate,
            Self::Responded { followup: Some(_), .. } => DispatchState::RespondedDeferred,
            Self::Failed(DispatchError::AlreadyResponded) => DispatchState::AlreadyResponded,
            Self::Failed(_) => DispatchState::Failed,
        }
    }
}

pub struct DispatchEngine {
    verifier: Arc<dyn RequestVerifier>,
    registry: Arc<CallbackRegistry>,
    deferrer: DeferredTaskManager,
    context: ClientContext,
    debug_payloads: bool,
}

impl DispatchEngine {
    pub fn new(
        verifier: Arc<dyn RequestVerifier>,
        registry: Arc<CallbackRegistry>,
        deferrer: DeferredTaskManager,
        context: ClientContext,
    ) -> Self {
        Self {
            verifier,
            registry,
            deferrer,
            context,
            debug_payloads: false,
        }
    }

    /// Log inbound and outbound payloads at debug level.
    pub fn with_payload_logging(mut self, enabled: bool) -> Self {
        self.debug_payloads = enabled;
        self
    }

    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    pub fn deferrer(&self) -> &DeferredTaskManager {
        &self.deferrer
    }

    /// Dispatch one inbound request to completion of its primary response.
    pub async fn handle(&self, request: InboundRequest<'_>) -> DispatchOutcome {
        let span = info_span!(
            "interaction",
            request_id = %Uuid::now_v7(),
            kind = field::Empty,
            route = field::Empty,
        );
        self.process(request).instrument(span).await
    }

    async fn process(&self, request: InboundRequest<'_>) -> DispatchOutcome {
        if let Err(e) = self.authenticate(&request) {
            warn!(error = %e, "rejected interaction");
            return DispatchOutcome::Unauthorized;
        }

        if self.debug_payloads {
            debug!(payload = %String::from_utf8_lossy(request.body), "inbound interaction");
        }

        let interaction = match Interaction::from_slice(request.body) {
            Ok(interaction) => Arc::new(interaction),
            Err(e) => {
                warn!(error = %e, "malformed interaction");
                return DispatchOutcome::Malformed(e.to_string());
            }
        };

        let route = match classify(&interaction) {
            Ok(route) => route,
            Err(e) => {
                warn!(error = %e, "unclassifiable interaction");
                return DispatchOutcome::Malformed(e.to_string());
            }
        };

        let span = Span::current();
        span.record("kind", interaction.kind.as_str());
        span.record("route", route.key().as_str());
        debug!(state = DispatchState::Classified.as_str(), "interaction classified");

        if route == Route::Acknowledge {
            return self.emit(&interaction, route.kind(), Reply::Response(Response::AcknowledgePing));
        }

        let Some(handler) = self.registry.resolve(&route) else {
            debug!(route_kind = route.kind().as_str(), "no handler registered");
            return DispatchOutcome::NotFound;
        };

        let handle = tokio::spawn(
            handler
                .invoke(Arc::clone(&interaction), &route)
                .in_current_span(),
        );
        debug!(state = DispatchState::Invoked.as_str(), "handler started");

        let reply = if self.deferrer.applies_to(route.kind()) {
            self.deferrer.race(handle).await
        } else {
            self.deferrer.await_handler(handle).await
        };

        match reply {
            Ok(reply) => self.emit(&interaction, route.kind(), reply),
            Err(e) => {
                error!(error = %e, "handler failed");
                DispatchOutcome::Failed(e)
            }
        }
    }

    fn authenticate(&self, request: &InboundRequest<'_>) -> Result<(), AuthError> {
        let (Some(timestamp), Some(signature)) = (request.timestamp, request.signature) else {
            return Err(AuthError::BadSignature);
        };
        let signature = hex::decode(signature).map_err(|_| AuthError::BadSignature)?;
        self.verifier.verify(timestamp, request.body, &signature)
    }

    /// Produce the single primary response for `interaction`.
    ///
    /// The `responded` flag flips before anything is emitted; a second call
    /// for the same interaction fails with `AlreadyResponded`.
    fn emit(&self, interaction: &Arc<Interaction>, kind: RouteKind, reply: Reply) -> DispatchOutcome {
        if !interaction.mark_responded() {
            error!("interaction already responded to, dropping second response");
            return DispatchOutcome::Failed(DispatchError::AlreadyResponded);
        }

        let outcome = match reply {
            Reply::Response(response) => DispatchOutcome::Responded {
                response: match response {
                    Response::Defer { ephemeral } | Response::ComponentDefer { ephemeral } => {
                        defer_for(kind, ephemeral)
                    }
                    other => other,
                },
                followup: None,
            },
            Reply::Deferred(deferred) => {
                let (work, ephemeral) = deferred.into_parts();
                let work = work.start(&self.context, interaction);
                let followup =
                    self.deferrer
                        .spawn_followup(work, Arc::clone(interaction), self.context.clone());
                DispatchOutcome::Responded {
                    response: defer_for(kind, ephemeral),
                    followup: Some(followup),
                }
            }
        };

        if let DispatchOutcome::Responded { response, followup } = &outcome {
            info!(
                state = outcome.state().as_str(),
                response_type = ?response.response_type(),
                deferred = followup.is_some(),
                "responded"
            );
            if self.debug_payloads {
                match serde_json::to_string(response) {
                    Ok(json) => debug!(payload = %json, "outbound response"),
                    Err(e) => debug!(error = %e, "outbound response not serializable"),
                }
            }
        }

        outcome
    }
}

/// The defer wire type matching the route kind.
fn defer_for(kind: RouteKind, ephemeral: bool) -> Response {
    match kind {
        RouteKind::Component => Response::ComponentDefer { ephemeral },
        _ => Response::Defer { ephemeral },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;
    use sleet_types::config::AutoDeferConfig;
    use sleet_types::error::{DeliveryError, DuplicateKeyError};
    use sleet_types::interaction::ComponentType;
    use sleet_types::response::MessagePayload;

    use crate::args::{CommandArgs, ParamKind};
    use crate::handler::{
        AutocompleteHandler, CommandHandler, ComponentHandler, DeferredResponse, ModalHandler,
    };
    use crate::notify::{FollowupTransport, WebhookNotifier};

    /// Accepts exactly one signature: `0xab`.
    struct FixedVerifier;

    impl RequestVerifier for FixedVerifier {
        fn verify(&self, _timestamp: &str, _body: &[u8], signature: &[u8]) -> Result<(), AuthError> {
            if signature == [0xab] {
                Ok(())
            } else {
                Err(AuthError::BadSignature)
            }
        }
    }

    #[derive(Default, Clone)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<(String, MessagePayload)>>>,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<(String, MessagePayload)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl FollowupTransport for RecordingTransport {
        async fn edit_original(
            &self,
            token: &str,
            payload: &MessagePayload,
        ) -> Result<(), DeliveryError> {
            self.sent
                .lock()
                .unwrap()
                .push((token.to_string(), payload.clone()));
            Ok(())
        }
    }

    struct Harness {
        engine: DispatchEngine,
        transport: RecordingTransport,
    }

    impl Harness {
        fn new(policy: AutoDeferConfig) -> Self {
            let transport = RecordingTransport::default();
            let context = ClientContext::new("app-1", WebhookNotifier::new(transport.clone()));
            let engine = DispatchEngine::new(
                Arc::new(FixedVerifier),
                Arc::new(CallbackRegistry::new()),
                DeferredTaskManager::new(policy),
                context,
            );
            Self { engine, transport }
        }

        fn registry(&self) -> &CallbackRegistry {
            self.engine.registry()
        }

        async fn send(&self, body: serde_json::Value) -> DispatchOutcome {
            let body = body.to_string();
            self.engine
                .handle(InboundRequest {
                    timestamp: Some("1700000000"),
                    signature: Some("ab"),
                    body: body.as_bytes(),
                })
                .await
        }

        async fn drain(&self) {
            assert!(self.engine.deferrer().shutdown(Duration::from_secs(2)).await);
        }
    }

    fn auto_defer(timeout_ms: u64) -> AutoDeferConfig {
        AutoDeferConfig {
            enabled: true,
            timeout_ms,
            ephemeral: false,
        }
    }

    fn command_body(name: &str, options: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "1",
            "application_id": "app-1",
            "type": 2,
            "token": "tok-cmd",
            "data": {"id": "9", "name": name, "options": options}
        })
    }

    fn button_body(custom_id: &str) -> serde_json::Value {
        json!({
            "id": "2",
            "type": 3,
            "token": "tok-btn",
            "data": {"custom_id": custom_id, "component_type": 2}
        })
    }

    fn expect_response(outcome: DispatchOutcome) -> (Response, bool) {
        match outcome {
            DispatchOutcome::Responded { response, followup } => {
                let deferred = followup.is_some();
                // Stand in for the HTTP layer having sent the primary response.
                if let Some(followup) = followup {
                    followup.release();
                }
                (response, deferred)
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    fn counting_command(name: &str, calls: Arc<AtomicUsize>) -> CommandHandler {
        CommandHandler::new(name, move |_interaction, _args: CommandArgs| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Response::message("pong"))
            }
        })
    }

    #[tokio::test]
    async fn bad_signature_never_reaches_handlers() {
        let harness = Harness::new(AutoDeferConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        harness
            .registry()
            .register_command(counting_command("ping", Arc::clone(&calls)))
            .unwrap();

        let body = command_body("ping", json!([])).to_string();
        let outcome = harness
            .engine
            .handle(InboundRequest {
                timestamp: Some("1700000000"),
                signature: Some("cd"),
                body: body.as_bytes(),
            })
            .await;

        assert!(matches!(outcome, DispatchOutcome::Unauthorized));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_or_non_hex_signature_is_unauthorized() {
        let harness = Harness::new(AutoDeferConfig::default());
        let body = br#"{"type":1}"#;

        for (timestamp, signature) in [
            (None, Some("ab")),
            (Some("1"), None),
            (Some("1"), Some("not-hex")),
        ] {
            let outcome = harness
                .engine
                .handle(InboundRequest {
                    timestamp,
                    signature,
                    body,
                })
                .await;
            assert_eq!(outcome.state(), DispatchState::Unauthorized);
        }
    }

    #[tokio::test]
    async fn ping_is_acknowledged_without_the_registry() {
        let harness = Harness::new(auto_defer(10));
        let calls = Arc::new(AtomicUsize::new(0));
        harness
            .registry()
            .register_command(counting_command("ping", Arc::clone(&calls)))
            .unwrap();

        let (response, deferred) = expect_response(harness.send(json!({"type": 1, "token": "t"})).await);
        assert_eq!(response, Response::AcknowledgePing);
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({"type": 1}));
        assert!(!deferred);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_command_is_not_found() {
        let harness = Harness::new(AutoDeferConfig::default());
        let outcome = harness.send(command_body("missing", json!([]))).await;
        assert!(matches!(outcome, DispatchOutcome::NotFound));
        harness.drain().await;
        assert!(harness.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let harness = Harness::new(AutoDeferConfig::default());
        let outcome = harness.send(json!({"type": 99})).await;
        assert_eq!(outcome.state(), DispatchState::Malformed);

        let outcome = harness.send(json!({"type": 2, "token": "t"})).await;
        assert_eq!(outcome.state(), DispatchState::Malformed);
    }

    #[tokio::test]
    async fn ping_command_replies_immediately() {
        let harness = Harness::new(AutoDeferConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        harness
            .registry()
            .register_command(counting_command("ping", Arc::clone(&calls)))
            .unwrap();

        let outcome = harness.send(command_body("ping", json!([]))).await;
        assert_eq!(outcome.state(), DispatchState::RespondedImmediate);
        let (response, _) = expect_response(outcome);
        assert_eq!(response, Response::message("pong"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        harness.drain().await;
        assert!(harness.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn command_arguments_are_bound_leniently() {
        let harness = Harness::new(AutoDeferConfig::default());
        harness
            .registry()
            .register_command(
                CommandHandler::new("echo", |_interaction, args: CommandArgs| async move {
                    let text = args.str("text").unwrap_or_default().to_string();
                    let times = args.i64("times").unwrap_or(1).max(1) as usize;
                    let raw = args.get("times").is_some_and(|v| v.is_raw());
                    Ok(Response::message(format!("{} raw={raw}", vec![text; times].join(" "))))
                })
                .param("text", ParamKind::String)
                .param("times", ParamKind::Integer),
            )
            .unwrap();

        let outcome = harness
            .send(command_body(
                "echo",
                json!([
                    {"name": "text", "type": 3, "value": "hi"},
                    {"name": "times", "type": 4, "value": 2}
                ]),
            ))
            .await;
        assert_eq!(expect_response(outcome).0, Response::message("hi hi raw=false"));

        let outcome = harness
            .send(command_body(
                "echo",
                json!([
                    {"name": "text", "type": 3, "value": "hi"},
                    {"name": "times", "type": 3, "value": "many"}
                ]),
            ))
            .await;
        assert_eq!(expect_response(outcome).0, Response::message("hi raw=true"));
    }

    #[tokio::test]
    async fn fast_handler_keeps_its_own_response() {
        let harness = Harness::new(auto_defer(500));
        harness
            .registry()
            .register_command(CommandHandler::new("quick", |_i, _a: CommandArgs| async {
                Ok(Response::message("done"))
            }))
            .unwrap();

        let (response, deferred) = expect_response(harness.send(command_body("quick", json!([]))).await);
        assert_eq!(response, Response::message("done"));
        assert!(!deferred);
        harness.drain().await;
        assert!(harness.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn slow_handler_is_deferred_then_followed_up_once() {
        let harness = Harness::new(auto_defer(50));
        harness
            .registry()
            .register_command(CommandHandler::new("think", |_i, _a: CommandArgs| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(Response::message("thought"))
            }))
            .unwrap();

        let outcome = harness.send(command_body("think", json!([]))).await;
        assert_eq!(outcome.state(), DispatchState::RespondedDeferred);
        let (response, _) = expect_response(outcome);
        assert_eq!(response, Response::Defer { ephemeral: false });
        assert!(harness.transport.sent().is_empty());

        harness.drain().await;
        let sent = harness.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "tok-cmd");
        assert_eq!(sent[0].1.content.as_deref(), Some("thought"));
    }

    #[tokio::test]
    async fn slow_component_gets_component_defer() {
        let harness = Harness::new(AutoDeferConfig {
            enabled: true,
            timeout_ms: 30,
            ephemeral: true,
        });
        harness
            .registry()
            .register_component(ComponentHandler::new("confirm", ComponentType::Button, |_i| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(Response::message("confirmed"))
            }))
            .unwrap();

        let (response, deferred) = expect_response(harness.send(button_body("confirm")).await);
        assert!(deferred);
        assert_eq!(response, Response::ComponentDefer { ephemeral: true });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"type": 6, "data": {"flags": 64}})
        );

        harness.drain().await;
        assert_eq!(harness.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn modals_are_never_raced() {
        let harness = Harness::new(auto_defer(10));
        harness
            .registry()
            .register_modal(ModalHandler::new("feedback", |_i| async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(Response::message("thanks"))
            }))
            .unwrap();

        let body = json!({
            "type": 5,
            "token": "tok-modal",
            "data": {"custom_id": "feedback", "components": []}
        });
        let (response, deferred) = expect_response(harness.send(body).await);
        assert_eq!(response, Response::message("thanks"));
        assert!(!deferred);
    }

    #[tokio::test]
    async fn explicit_deferred_callable_is_started_and_delivered() {
        let harness = Harness::new(AutoDeferConfig::default());
        harness
            .registry()
            .register_component(ComponentHandler::new("confirm", ComponentType::Button, |_i| async {
                Ok(DeferredResponse::callable(|ctx: ClientContext, interaction: Arc<Interaction>| async move {
                    Ok(Some(Response::message(format!(
                        "{} via {}",
                        interaction.token,
                        ctx.application_id()
                    ))))
                })
                .ephemeral())
            }))
            .unwrap();

        let (response, deferred) = expect_response(harness.send(button_body("confirm")).await);
        assert!(deferred);
        assert_eq!(response, Response::ComponentDefer { ephemeral: true });

        harness.drain().await;
        let sent = harness.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.content.as_deref(), Some("tok-btn via app-1"));
    }

    #[tokio::test]
    async fn deferred_work_returning_nothing_sends_no_followup() {
        let harness = Harness::new(AutoDeferConfig::default());
        harness
            .registry()
            .register_command(CommandHandler::new("quiet", |_i, _a: CommandArgs| async {
                Ok(DeferredResponse::task(tokio::spawn(async { anyhow::Ok(None) })))
            }))
            .unwrap();

        let (response, _) = expect_response(harness.send(command_body("quiet", json!([]))).await);
        assert_eq!(response, Response::Defer { ephemeral: false });
        harness.drain().await;
        assert!(harness.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn synchronous_handler_error_fails_the_request() {
        let harness = Harness::new(AutoDeferConfig::default());
        harness
            .registry()
            .register_command(CommandHandler::new("broken", |_i, _a: CommandArgs| async {
                Err::<Response, _>(anyhow::anyhow!("database unavailable"))
            }))
            .unwrap();

        let outcome = harness.send(command_body("broken", json!([]))).await;
        match outcome {
            DispatchOutcome::Failed(DispatchError::Handler(e)) => {
                assert_eq!(e.to_string(), "database unavailable")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_primary_response_is_rejected() {
        let harness = Harness::new(AutoDeferConfig::default());
        let interaction = Arc::new(
            Interaction::from_slice(command_body("ping", json!([])).to_string().as_bytes()).unwrap(),
        );

        let first = harness.engine.emit(
            &interaction,
            RouteKind::Command,
            Reply::Response(Response::message("one")),
        );
        assert_eq!(first.state(), DispatchState::RespondedImmediate);

        let second = harness.engine.emit(
            &interaction,
            RouteKind::Command,
            Reply::Response(Response::message("two")),
        );
        assert_eq!(second.state(), DispatchState::AlreadyResponded);
        assert!(interaction.is_responded());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn followup_is_held_until_primary_is_released() {
        let harness = Harness::new(AutoDeferConfig::default());
        harness
            .registry()
            .register_command(CommandHandler::new("instant", |_i, _a: CommandArgs| async {
                Ok(DeferredResponse::callable(|_ctx, _interaction| async {
                    Ok(Some(Response::message("done")))
                }))
            }))
            .unwrap();

        for _ in 0..50 {
            let outcome = harness.send(command_body("instant", json!([]))).await;
            let DispatchOutcome::Responded {
                response,
                followup: Some(followup),
            } = outcome
            else {
                panic!("expected a deferred primary response");
            };
            assert_eq!(response, Response::Defer { ephemeral: false });

            tokio::time::sleep(Duration::from_millis(5)).await;
            assert!(harness.transport.sent().is_empty());
            drop(followup);
        }

        let outcome = harness.send(command_body("instant", json!([]))).await;
        expect_response(outcome);
        harness.drain().await;
        assert_eq!(harness.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn autocomplete_without_focused_option_is_not_found() {
        let harness = Harness::new(AutoDeferConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        harness
            .registry()
            .register_autocomplete(AutocompleteHandler::new("echo", "text", move |_i, _value| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Response::AutocompleteResult(Vec::new()))
                }
            }))
            .unwrap();

        let body = json!({
            "type": 4,
            "token": "tok-ac",
            "data": {
                "name": "echo",
                "options": [{"name": "text", "type": 3, "value": "he"}]
            }
        });
        let outcome = harness.send(body).await;
        assert!(matches!(outcome, DispatchOutcome::NotFound));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn duplicate_component_key_keeps_first() {
        let registry = CallbackRegistry::new();
        registry
            .register_component(ComponentHandler::new("btn1", ComponentType::Button, |_i| async {
                Ok(Response::message("first"))
            }))
            .unwrap();
        let err: DuplicateKeyError = registry
            .register_component(ComponentHandler::new("btn1", ComponentType::Button, |_i| async {
                Ok(Response::message("second"))
            }))
            .unwrap_err();
        assert_eq!(err.to_string(), "component handler already registered for key 'btn1/button'");
        assert_eq!(registry.len(), 1);
    }
}
