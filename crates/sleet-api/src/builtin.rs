//! Built-in demo handlers served by `sleet serve`.
//!
//! - `/ping` replies "pong"
//! - `/echo text times` repeats text, with autocomplete on `text` and a
//!   `confirm` button under the reply
//! - `/think` answers with a defer and follows up once the slow work is done
//! - `/feedback` opens the `feedback` modal, whose submission is acknowledged

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use sleet_core::args::{CommandArgs, ParamKind};
use sleet_core::handler::{
    AutocompleteHandler, ClientContext, CommandHandler, ComponentHandler, DeferredResponse,
    ModalHandler,
};
use sleet_core::registry::CallbackRegistry;
use sleet_types::error::DuplicateKeyError;
use sleet_types::interaction::{ComponentType, Interaction};
use sleet_types::response::{AutocompleteChoice, MessagePayload, ModalPayload, Response};

/// Upper bound on `/echo times`.
const MAX_ECHO_REPEATS: i64 = 5;

/// How long `/think` pretends to work.
const THINK_DURATION: Duration = Duration::from_secs(3);

/// Suggestions offered for `/echo text`.
const ECHO_SUGGESTIONS: &[&str] = &["hello", "hello world", "help", "howdy", "hi there"];

/// Platform limit on autocomplete choices.
const MAX_CHOICES: usize = 25;

const CONFIRM_BUTTON: &str = "confirm";
const FEEDBACK_MODAL: &str = "feedback";
const FEEDBACK_FIELD: &str = "feedback_text";

/// Register every built-in handler.
pub fn register_builtin(registry: &CallbackRegistry) -> Result<(), DuplicateKeyError> {
    registry.register_command(CommandHandler::new("ping", |_interaction, _args: CommandArgs| async {
        Ok(Response::message("pong"))
    }))?;

    registry.register_command(
        CommandHandler::new("echo", |_interaction, args: CommandArgs| async move { Ok(echo(&args)) })
            .param("text", ParamKind::String)
            .param("times", ParamKind::Integer),
    )?;

    registry.register_autocomplete(AutocompleteHandler::new(
        "echo",
        "text",
        |_interaction, value| async move {
            Ok(Response::AutocompleteResult(suggest(value.as_str().unwrap_or_default())))
        },
    ))?;

    registry.register_command(CommandHandler::new("think", |_interaction, _args: CommandArgs| async {
        Ok(DeferredResponse::callable(think))
    }))?;

    registry.register_command(CommandHandler::new(
        "feedback",
        |_interaction, _args: CommandArgs| async { Ok(feedback_form()) },
    ))?;

    registry.register_component(ComponentHandler::new(
        CONFIRM_BUTTON,
        ComponentType::Button,
        |interaction: Arc<Interaction>| async move {
            let who = interaction
                .user_id
                .as_deref()
                .map(|id| format!("<@{id}>"))
                .unwrap_or_else(|| "someone".to_string());
            Ok(Response::EditOriginalMessage(MessagePayload::text(format!(
                "Confirmed by {who}."
            ))))
        },
    ))?;

    registry.register_modal(ModalHandler::new(
        FEEDBACK_MODAL,
        |interaction: Arc<Interaction>| async move {
            let text = interaction
                .modal_data()
                .and_then(|data| data.field(FEEDBACK_FIELD))
                .unwrap_or_default()
                .trim()
                .to_string();
            let reply = if text.is_empty() {
                "Thanks for stopping by.".to_string()
            } else {
                format!("Thanks for the feedback: {text}")
            };
            Ok(Response::Message(MessagePayload::text(reply).ephemeral()))
        },
    ))?;

    Ok(())
}

fn echo(args: &CommandArgs) -> Response {
    let Some(text) = args.str("text").filter(|t| !t.is_empty()) else {
        return Response::Message(MessagePayload::text("Nothing to echo.").ephemeral());
    };
    let times = args.i64("times").unwrap_or(1).clamp(1, MAX_ECHO_REPEATS) as usize;

    Response::Message(
        MessagePayload::text(vec![text; times].join(" ")).component(json!({
            "type": 1,
            "components": [{
                "type": 2,
                "style": 1,
                "label": "Confirm",
                "custom_id": CONFIRM_BUTTON,
            }]
        })),
    )
}

fn suggest(prefix: &str) -> Vec<AutocompleteChoice> {
    let prefix = prefix.to_lowercase();
    ECHO_SUGGESTIONS
        .iter()
        .filter(|s| s.starts_with(&prefix))
        .take(MAX_CHOICES)
        .map(|s| AutocompleteChoice::new(*s, *s))
        .collect()
}

async fn think(
    _context: ClientContext,
    interaction: Arc<Interaction>,
) -> anyhow::Result<Option<Response>> {
    tokio::time::sleep(THINK_DURATION).await;
    let locale = interaction.locale.as_deref().unwrap_or("en-US");
    Ok(Some(Response::message(format!(
        "Thought it over for {}s ({locale}).",
        THINK_DURATION.as_secs()
    ))))
}

fn feedback_form() -> Response {
    Response::Modal(ModalPayload {
        custom_id: FEEDBACK_MODAL.to_string(),
        title: "Feedback".to_string(),
        components: vec![json!({
            "type": 1,
            "components": [{
                "type": 4,
                "custom_id": FEEDBACK_FIELD,
                "label": "What's on your mind?",
                "style": 2,
                "required": false,
            }]
        })],
    })
}
