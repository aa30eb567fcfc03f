//! Inbound interaction model.
//!
//! An `Interaction` is one user-triggered event delivered by the platform:
//! a slash-command invocation, a component click, a modal submission, an
//! autocomplete query, or a liveness ping. It is immutable once parsed except
//! for the `responded` flag, which flips from false to true exactly once.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::InteractionParseError;

// ---------------------------------------------------------------------------
// Wire enums
// ---------------------------------------------------------------------------

/// Declared type of an inbound interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    MessageComponent,
    ApplicationCommandAutocomplete,
    ModalSubmit,
}

impl InteractionType {
    /// Short lowercase name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::ApplicationCommand => "application_command",
            Self::MessageComponent => "message_component",
            Self::ApplicationCommandAutocomplete => "autocomplete",
            Self::ModalSubmit => "modal_submit",
        }
    }
}

impl TryFrom<u8> for InteractionType {
    type Error = InteractionParseError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Ping),
            2 => Ok(Self::ApplicationCommand),
            3 => Ok(Self::MessageComponent),
            4 => Ok(Self::ApplicationCommandAutocomplete),
            5 => Ok(Self::ModalSubmit),
            _ => Err(InteractionParseError::UnknownCode {
                kind: "interaction type",
                code,
            }),
        }
    }
}

impl From<InteractionType> for u8 {
    fn from(kind: InteractionType) -> u8 {
        match kind {
            InteractionType::Ping => 1,
            InteractionType::ApplicationCommand => 2,
            InteractionType::MessageComponent => 3,
            InteractionType::ApplicationCommandAutocomplete => 4,
            InteractionType::ModalSubmit => 5,
        }
    }
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subtype of a message component; part of the component routing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ComponentType {
    ActionRow,
    Button,
    StringSelect,
    TextInput,
    UserSelect,
    RoleSelect,
    MentionableSelect,
    ChannelSelect,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActionRow => "action_row",
            Self::Button => "button",
            Self::StringSelect => "string_select",
            Self::TextInput => "text_input",
            Self::UserSelect => "user_select",
            Self::RoleSelect => "role_select",
            Self::MentionableSelect => "mentionable_select",
            Self::ChannelSelect => "channel_select",
        }
    }
}

impl TryFrom<u8> for ComponentType {
    type Error = InteractionParseError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::ActionRow),
            2 => Ok(Self::Button),
            3 => Ok(Self::StringSelect),
            4 => Ok(Self::TextInput),
            5 => Ok(Self::UserSelect),
            6 => Ok(Self::RoleSelect),
            7 => Ok(Self::MentionableSelect),
            8 => Ok(Self::ChannelSelect),
            _ => Err(InteractionParseError::UnknownCode {
                kind: "component type",
                code,
            }),
        }
    }
}

impl From<ComponentType> for u8 {
    fn from(kind: ComponentType) -> u8 {
        match kind {
            ComponentType::ActionRow => 1,
            ComponentType::Button => 2,
            ComponentType::StringSelect => 3,
            ComponentType::TextInput => 4,
            ComponentType::UserSelect => 5,
            ComponentType::RoleSelect => 6,
            ComponentType::MentionableSelect => 7,
            ComponentType::ChannelSelect => 8,
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a slash-command option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OptionType {
    SubCommand,
    SubCommandGroup,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl TryFrom<u8> for OptionType {
    type Error = InteractionParseError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::SubCommand),
            2 => Ok(Self::SubCommandGroup),
            3 => Ok(Self::String),
            4 => Ok(Self::Integer),
            5 => Ok(Self::Boolean),
            6 => Ok(Self::User),
            7 => Ok(Self::Channel),
            8 => Ok(Self::Role),
            9 => Ok(Self::Mentionable),
            10 => Ok(Self::Number),
            11 => Ok(Self::Attachment),
            _ => Err(InteractionParseError::UnknownCode {
                kind: "option type",
                code,
            }),
        }
    }
}

impl From<OptionType> for u8 {
    fn from(kind: OptionType) -> u8 {
        match kind {
            OptionType::SubCommand => 1,
            OptionType::SubCommandGroup => 2,
            OptionType::String => 3,
            OptionType::Integer => 4,
            OptionType::Boolean => 5,
            OptionType::User => 6,
            OptionType::Channel => 7,
            OptionType::Role => 8,
            OptionType::Mentionable => 9,
            OptionType::Number => 10,
            OptionType::Attachment => 11,
        }
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// One option supplied with a command or autocomplete interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OptionType,
    /// Raw value as sent by the platform (absent for sub-command groups).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Set on the single option the user is typing into (autocomplete only).
    #[serde(default)]
    pub focused: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
}

impl CommandOption {
    /// Build a plain valued option.
    pub fn new(name: impl Into<String>, kind: OptionType, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            kind,
            value: Some(value),
            focused: false,
            options: Vec::new(),
        }
    }

    /// Mark this option as the focused one.
    pub fn focused(mut self) -> Self {
        self.focused = true;
        self
    }
}

/// Payload of an application-command or autocomplete interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandData {
    /// Find a top-level option by name.
    pub fn option(&self, name: &str) -> Option<&CommandOption> {
        self.options.iter().find(|o| o.name == name)
    }

    /// The option flagged `focused`, if any.
    pub fn focused_option(&self) -> Option<&CommandOption> {
        self.options.iter().find(|o| o.focused)
    }
}

/// Payload of a message-component interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentData {
    pub custom_id: String,
    pub component_type: ComponentType,
    /// Selected values for select menus; empty for buttons.
    #[serde(default)]
    pub values: Vec<String>,
}

/// One submitted text-input value of a modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalField {
    pub custom_id: String,
    #[serde(default)]
    pub value: String,
}

/// Payload of a modal-submit interaction, with field values flattened out of
/// their action rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModalData {
    pub custom_id: String,
    pub fields: Vec<ModalField>,
}

impl ModalData {
    /// Value of the field with the given custom id.
    pub fn field(&self, custom_id: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.custom_id == custom_id)
            .map(|f| f.value.as_str())
    }
}

/// Type-specific payload of an interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionData {
    /// Pings carry no payload.
    None,
    /// Commands and autocomplete queries.
    Command(CommandData),
    Component(ComponentData),
    Modal(ModalData),
}

// ---------------------------------------------------------------------------
// Interaction
// ---------------------------------------------------------------------------

/// An inbound, parsed interaction.
#[derive(Debug, Deserialize)]
#[serde(try_from = "RawInteraction")]
pub struct Interaction {
    pub id: String,
    pub application_id: String,
    pub kind: InteractionType,
    pub data: InteractionData,
    /// Correlation token addressing the follow-up webhook.
    pub token: String,
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
    /// Invoking user (from `member.user` in guilds, `user` in DMs).
    pub user_id: Option<String>,
    pub locale: Option<String>,
    responded: AtomicBool,
}

impl Interaction {
    /// Build an interaction directly (used by tests and in-process callers).
    pub fn new(kind: InteractionType, data: InteractionData, token: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            application_id: String::new(),
            kind,
            data,
            token: token.into(),
            guild_id: None,
            channel_id: None,
            user_id: None,
            locale: None,
            responded: AtomicBool::new(false),
        }
    }

    /// Parse an interaction from the raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn command_data(&self) -> Option<&CommandData> {
        match &self.data {
            InteractionData::Command(data) => Some(data),
            _ => None,
        }
    }

    pub fn component_data(&self) -> Option<&ComponentData> {
        match &self.data {
            InteractionData::Component(data) => Some(data),
            _ => None,
        }
    }

    pub fn modal_data(&self) -> Option<&ModalData> {
        match &self.data {
            InteractionData::Modal(data) => Some(data),
            _ => None,
        }
    }

    /// Whether a primary response has already been produced.
    pub fn is_responded(&self) -> bool {
        self.responded.load(Ordering::Acquire)
    }

    /// Flip `responded` from false to true.
    ///
    /// Returns `false` if the flag was already set, i.e. a primary response
    /// was already produced for this interaction.
    pub fn mark_responded(&self) -> bool {
        self.responded
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Wire shape of an interaction before its `data` is interpreted.
#[derive(Deserialize)]
struct RawInteraction {
    #[serde(default)]
    id: String,
    #[serde(default)]
    application_id: String,
    #[serde(rename = "type")]
    kind: InteractionType,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    token: String,
    guild_id: Option<String>,
    channel_id: Option<String>,
    member: Option<RawMember>,
    user: Option<RawUser>,
    locale: Option<String>,
}

#[derive(Deserialize)]
struct RawMember {
    user: Option<RawUser>,
}

#[derive(Deserialize)]
struct RawUser {
    id: String,
}

#[derive(Deserialize)]
struct RawModalData {
    custom_id: String,
    #[serde(default)]
    components: Vec<RawModalRow>,
}

#[derive(Deserialize)]
struct RawModalRow {
    #[serde(default)]
    components: Vec<ModalField>,
}

fn parse_data<T: serde::de::DeserializeOwned>(
    kind: InteractionType,
    data: Option<serde_json::Value>,
) -> Result<T, InteractionParseError> {
    let data = data.ok_or(InteractionParseError::MissingData(kind.as_str()))?;
    serde_json::from_value(data).map_err(|e| InteractionParseError::InvalidData {
        kind: kind.as_str(),
        message: e.to_string(),
    })
}

impl TryFrom<RawInteraction> for Interaction {
    type Error = InteractionParseError;

    fn try_from(raw: RawInteraction) -> Result<Self, Self::Error> {
        let data = match raw.kind {
            InteractionType::Ping => InteractionData::None,
            InteractionType::ApplicationCommand
            | InteractionType::ApplicationCommandAutocomplete => {
                InteractionData::Command(parse_data(raw.kind, raw.data)?)
            }
            InteractionType::MessageComponent => {
                InteractionData::Component(parse_data(raw.kind, raw.data)?)
            }
            InteractionType::ModalSubmit => {
                let modal: RawModalData = parse_data(raw.kind, raw.data)?;
                InteractionData::Modal(ModalData {
                    custom_id: modal.custom_id,
                    fields: modal
                        .components
                        .into_iter()
                        .flat_map(|row| row.components)
                        .collect(),
                })
            }
        };

        let user_id = raw
            .member
            .and_then(|m| m.user)
            .or(raw.user)
            .map(|u| u.id);

        Ok(Self {
            id: raw.id,
            application_id: raw.application_id,
            kind: raw.kind,
            data,
            token: raw.token,
            guild_id: raw.guild_id,
            channel_id: raw.channel_id,
            user_id,
            locale: raw.locale,
            responded: AtomicBool::new(false),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
