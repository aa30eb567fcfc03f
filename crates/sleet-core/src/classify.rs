//! Request classification.
//!
//! Maps a parsed `Interaction` to a `Route`: the route kind plus the
//! discriminator used to look up a handler. Classification is pure; the same
//! interaction always yields the same route.

use sleet_types::error::InteractionParseError;
use sleet_types::interaction::{ComponentType, Interaction, InteractionData, InteractionType};

/// Closed set of route kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Acknowledge,
    Command,
    Autocomplete,
    Component,
    Modal,
}

impl RouteKind {
    /// Only command and component routes take part in the auto-defer race.
    pub fn is_deferrable(&self) -> bool {
        matches!(self, Self::Command | Self::Component)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acknowledge => "acknowledge",
            Self::Command => "command",
            Self::Autocomplete => "autocomplete",
            Self::Component => "component",
            Self::Modal => "modal",
        }
    }
}

/// The option the user is typing into during an autocomplete query.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusedOption {
    pub name: String,
    pub value: serde_json::Value,
}

/// Route kind together with its discriminator.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Acknowledge,
    Command {
        name: String,
    },
    /// `focused` is `None` when no option carries the focused flag; such a
    /// request is answered not-found without invoking anything.
    Autocomplete {
        command: String,
        focused: Option<FocusedOption>,
    },
    Component {
        custom_id: String,
        component_type: ComponentType,
    },
    Modal {
        custom_id: String,
    },
}

impl Route {
    pub fn kind(&self) -> RouteKind {
        match self {
            Self::Acknowledge => RouteKind::Acknowledge,
            Self::Command { .. } => RouteKind::Command,
            Self::Autocomplete { .. } => RouteKind::Autocomplete,
            Self::Component { .. } => RouteKind::Component,
            Self::Modal { .. } => RouteKind::Modal,
        }
    }

    /// Human-readable discriminator, for logs.
    pub fn key(&self) -> String {
        match self {
            Self::Acknowledge => String::new(),
            Self::Command { name } => name.clone(),
            Self::Autocomplete { command, focused } => match focused {
                Some(option) => format!("{command}.{}", option.name),
                None => command.clone(),
            },
            Self::Component {
                custom_id,
                component_type,
            } => format!("{custom_id}/{component_type}"),
            Self::Modal { custom_id } => custom_id.clone(),
        }
    }
}

/// Classify an interaction by its declared type and discriminator fields.
///
/// Fails only when the payload does not match the declared type, which the
/// wire parser already rules out for interactions read off the network.
pub fn classify(interaction: &Interaction) -> Result<Route, InteractionParseError> {
    let mismatch = || InteractionParseError::MissingData(interaction.kind.as_str());

    match (interaction.kind, &interaction.data) {
        (InteractionType::Ping, _) => Ok(Route::Acknowledge),
        (InteractionType::ApplicationCommand, InteractionData::Command(data)) => {
            Ok(Route::Command {
                name: data.name.clone(),
            })
        }
        (InteractionType::ApplicationCommandAutocomplete, InteractionData::Command(data)) => {
            Ok(Route::Autocomplete {
                command: data.name.clone(),
                focused: data.focused_option().map(|option| FocusedOption {
                    name: option.name.clone(),
                    value: option.value.clone().unwrap_or(serde_json::Value::Null),
                }),
            })
        }
        (InteractionType::MessageComponent, InteractionData::Component(data)) => {
            Ok(Route::Component {
                custom_id: data.custom_id.clone(),
                component_type: data.component_type,
            })
        }
        (InteractionType::ModalSubmit, InteractionData::Modal(data)) => Ok(Route::Modal {
            custom_id: data.custom_id.clone(),
        }),
        _ => Err(mismatch()),
    }
}
