//! Handler variants and handler outputs.
//!
//! A handler is one of four closed variants, each holding its own
//! discriminator and invocation signature:
//! - `CommandHandler` -- keyed by command name, receives bound `CommandArgs`
//! - `ComponentHandler` -- keyed by `(custom_id, component_type)`
//! - `ModalHandler` -- keyed by modal `custom_id`
//! - `AutocompleteHandler` -- keyed by `(command, option)`, receives the
//!   focused option's raw value
//!
//! Handlers return a `Reply`: either a finished `Response` or a
//! `DeferredResponse` wrapping work whose result becomes a follow-up.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::Instrument;

use sleet_types::interaction::{ComponentType, Interaction};
use sleet_types::response::Response;

use crate::args::{CommandArgs, ParamKind, ParamSpec, bind_args};
use crate::classify::Route;
use crate::notify::WebhookNotifier;

/// Boxed handler future.
pub type HandlerFuture<T> = BoxFuture<'static, anyhow::Result<T>>;

// ---------------------------------------------------------------------------
// Client context
// ---------------------------------------------------------------------------

/// Dispatching-client context handed to deferred callables.
#[derive(Clone)]
pub struct ClientContext {
    application_id: Arc<str>,
    notifier: WebhookNotifier,
}

impl ClientContext {
    pub fn new(application_id: impl Into<Arc<str>>, notifier: WebhookNotifier) -> Self {
        Self {
            application_id: application_id.into(),
            notifier,
        }
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn notifier(&self) -> &WebhookNotifier {
        &self.notifier
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("application_id", &self.application_id)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Handler outputs
// ---------------------------------------------------------------------------

/// What a handler produces.
#[derive(Debug)]
pub enum Reply {
    /// Use this response as the primary reply.
    Response(Response),
    /// Answer with a defer now; deliver the work's result as a follow-up.
    Deferred(DeferredResponse),
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<DeferredResponse> for Reply {
    fn from(deferred: DeferredResponse) -> Self {
        Self::Deferred(deferred)
    }
}

/// A callable started at emission time with the client context and the
/// originating interaction.
pub type DeferredFn =
    Box<dyn FnOnce(ClientContext, Arc<Interaction>) -> HandlerFuture<Option<Response>> + Send>;

/// The unit of work a `DeferredResponse` owns.
pub enum DeferredWork {
    /// A handler the auto-defer race left running.
    Handler(JoinHandle<anyhow::Result<Reply>>),
    /// A task the handler started itself.
    Task(JoinHandle<anyhow::Result<Option<Response>>>),
    /// Not started yet.
    Pending(DeferredFn),
}

impl DeferredWork {
    /// Start pending work; running work is returned unchanged.
    pub fn start(self, context: &ClientContext, interaction: &Arc<Interaction>) -> Self {
        match self {
            Self::Pending(callable) => {
                let future = callable(context.clone(), Arc::clone(interaction));
                Self::Task(tokio::spawn(future.in_current_span()))
            }
            running => running,
        }
    }
}

impl std::fmt::Debug for DeferredWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("DeferredWork::Handler"),
            Self::Task(_) => f.write_str("DeferredWork::Task"),
            Self::Pending(_) => f.write_str("DeferredWork::Pending"),
        }
    }
}

/// A defer whose real content is produced by in-flight work.
///
/// Owns its work exclusively. A `None` result means no follow-up is sent.
#[derive(Debug)]
pub struct DeferredResponse {
    work: DeferredWork,
    ephemeral: bool,
}

impl DeferredResponse {
    /// Defer on an already-running task.
    pub fn task(handle: JoinHandle<anyhow::Result<Option<Response>>>) -> Self {
        Self {
            work: DeferredWork::Task(handle),
            ephemeral: false,
        }
    }

    /// Defer on a callable the engine starts when the defer is emitted.
    pub fn callable<F, Fut>(callable: F) -> Self
    where
        F: FnOnce(ClientContext, Arc<Interaction>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<Option<Response>>> + Send + 'static,
    {
        Self {
            work: DeferredWork::Pending(Box::new(
                move |context: ClientContext, interaction: Arc<Interaction>| -> HandlerFuture<Option<Response>> {
                    Box::pin(callable(context, interaction))
                },
            )),
            ephemeral: false,
        }
    }

    pub(crate) fn from_handler(handle: JoinHandle<anyhow::Result<Reply>>, ephemeral: bool) -> Self {
        Self {
            work: DeferredWork::Handler(handle),
            ephemeral,
        }
    }

    /// Make the defer (and the "thinking" state it shows) ephemeral.
    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    pub fn into_parts(self) -> (DeferredWork, bool) {
        (self.work, self.ephemeral)
    }
}

// ---------------------------------------------------------------------------
// Handler variants
// ---------------------------------------------------------------------------

type CommandFn = dyn Fn(Arc<Interaction>, CommandArgs) -> HandlerFuture<Reply> + Send + Sync;
type InteractionFn = dyn Fn(Arc<Interaction>) -> HandlerFuture<Reply> + Send + Sync;
type AutocompleteFn =
    dyn Fn(Arc<Interaction>, serde_json::Value) -> HandlerFuture<Reply> + Send + Sync;

/// Handler for a slash command.
#[derive(Clone)]
pub struct CommandHandler {
    name: String,
    params: Vec<ParamSpec>,
    func: Arc<CommandFn>,
}

impl CommandHandler {
    pub fn new<F, Fut, R>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Arc<Interaction>, CommandArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Reply> + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            func: Arc::new(move |interaction: Arc<Interaction>, args: CommandArgs| -> HandlerFuture<Reply> {
                let fut = func(interaction, args);
                Box::pin(async move { fut.await.map(Into::into) })
            }),
        }
    }

    /// Declare a parameter the handler wants bound from the options.
    pub fn param(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(ParamSpec::new(name, kind));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

/// Handler for a message component.
#[derive(Clone)]
pub struct ComponentHandler {
    custom_id: String,
    component_type: ComponentType,
    func: Arc<InteractionFn>,
}

impl ComponentHandler {
    pub fn new<F, Fut, R>(custom_id: impl Into<String>, component_type: ComponentType, func: F) -> Self
    where
        F: Fn(Arc<Interaction>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Reply> + 'static,
    {
        Self {
            custom_id: custom_id.into(),
            component_type,
            func: Arc::new(move |interaction: Arc<Interaction>| -> HandlerFuture<Reply> {
                let fut = func(interaction);
                Box::pin(async move { fut.await.map(Into::into) })
            }),
        }
    }

    pub fn custom_id(&self) -> &str {
        &self.custom_id
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }
}

/// Handler for a modal submission.
#[derive(Clone)]
pub struct ModalHandler {
    custom_id: String,
    func: Arc<InteractionFn>,
}

impl ModalHandler {
    pub fn new<F, Fut, R>(custom_id: impl Into<String>, func: F) -> Self
    where
        F: Fn(Arc<Interaction>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Reply> + 'static,
    {
        Self {
            custom_id: custom_id.into(),
            func: Arc::new(move |interaction: Arc<Interaction>| -> HandlerFuture<Reply> {
                let fut = func(interaction);
                Box::pin(async move { fut.await.map(Into::into) })
            }),
        }
    }

    pub fn custom_id(&self) -> &str {
        &self.custom_id
    }
}

/// Handler for autocomplete queries on one option of one command.
#[derive(Clone)]
pub struct AutocompleteHandler {
    command: String,
    option: String,
    func: Arc<AutocompleteFn>,
}

impl AutocompleteHandler {
    pub fn new<F, Fut, R>(command: impl Into<String>, option: impl Into<String>, func: F) -> Self
    where
        F: Fn(Arc<Interaction>, serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Reply> + 'static,
    {
        Self {
            command: command.into(),
            option: option.into(),
            func: Arc::new(move |interaction: Arc<Interaction>, value: serde_json::Value| -> HandlerFuture<Reply> {
                let fut = func(interaction, value);
                Box::pin(async move { fut.await.map(Into::into) })
            }),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn option(&self) -> &str {
        &self.option
    }
}

/// A resolved handler of any variant.
#[derive(Clone)]
pub enum Handler {
    Command(CommandHandler),
    Component(ComponentHandler),
    Modal(ModalHandler),
    Autocomplete(AutocompleteHandler),
}

impl Handler {
    /// Build the handler future for this interaction.
    ///
    /// For commands this binds the declared parameters against the supplied
    /// options; for autocomplete it passes the focused option's raw value.
    pub fn invoke(&self, interaction: Arc<Interaction>, route: &Route) -> HandlerFuture<Reply> {
        match self {
            Self::Command(handler) => {
                let args = interaction
                    .command_data()
                    .map(|data| bind_args(&handler.params, &data.options))
                    .unwrap_or_default();
                (handler.func)(interaction, args)
            }
            Self::Component(handler) => (handler.func)(interaction),
            Self::Modal(handler) => (handler.func)(interaction),
            Self::Autocomplete(handler) => {
                let value = match route {
                    Route::Autocomplete {
                        focused: Some(option),
                        ..
                    } => option.value.clone(),
                    _ => serde_json::Value::Null,
                };
                (handler.func)(interaction, value)
            }
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command(h) => write!(f, "Handler::Command({})", h.name),
            Self::Component(h) => {
                write!(f, "Handler::Component({}/{})", h.custom_id, h.component_type)
            }
            Self::Modal(h) => write!(f, "Handler::Modal({})", h.custom_id),
            Self::Autocomplete(h) => write!(f, "Handler::Autocomplete({}.{})", h.command, h.option),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sleet_types::interaction::{CommandData, CommandOption, InteractionData, InteractionType, OptionType};

    fn echo_interaction() -> Arc<Interaction> {
        Arc::new(Interaction::new(
            InteractionType::ApplicationCommand,
            InteractionData::Command(CommandData {
                id: None,
                name: "echo".to_string(),
                options: vec![CommandOption::new("text", OptionType::String, json!("hello"))],
            }),
            "tok",
        ))
    }

    #[tokio::test]
    async fn command_handler_receives_bound_args() {
        let handler = CommandHandler::new("echo", |_interaction, args: CommandArgs| async move {
            Ok(Response::message(args.str("text").unwrap_or_default().to_string()))
        })
        .param("text", ParamKind::String);

        let route = Route::Command { name: "echo".to_string() };
        let reply = Handler::Command(handler)
            .invoke(echo_interaction(), &route)
            .await
            .unwrap();

        match reply {
            Reply::Response(response) => assert_eq!(response, Response::message("hello")),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn autocomplete_handler_receives_focused_value() {
        let handler = AutocompleteHandler::new("echo", "text", |_interaction, value| async move {
            Ok(Response::message(value.as_str().unwrap_or_default().to_string()))
        });
        let route = Route::Autocomplete {
            command: "echo".to_string(),
            focused: Some(crate::classify::FocusedOption {
                name: "text".to_string(),
                value: json!("he"),
            }),
        };

        let reply = Handler::Autocomplete(handler)
            .invoke(echo_interaction(), &route)
            .await
            .unwrap();
        assert!(matches!(reply, Reply::Response(Response::Message(_))));
    }

    #[tokio::test]
    async fn handler_errors_propagate() {
        let handler = ModalHandler::new("feedback", |_interaction| async move {
            Err::<Response, _>(anyhow::anyhow!("storage offline"))
        });
        let route = Route::Modal { custom_id: "feedback".to_string() };

        let err = Handler::Modal(handler)
            .invoke(echo_interaction(), &route)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "storage offline");
    }

    #[test]
    fn deferred_response_ephemeral_flag() {
        let deferred = DeferredResponse::callable(|_ctx, _interaction| async { Ok(None) }).ephemeral();
        assert!(deferred.is_ephemeral());
        let (work, ephemeral) = deferred.into_parts();
        assert!(ephemeral);
        assert!(matches!(work, DeferredWork::Pending(_)));
    }
}
