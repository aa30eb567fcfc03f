//! Outbound response model.
//!
//! A `Response` is what a handler produces and what leaves the system as the
//! primary HTTP reply (or, for messages, as the body of a follow-up call).
//! Serializing a `Response` yields the platform's wire shape:
//! `{"type": <code>, "data": {...}}`.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Message flag bit that restricts visibility to the invoking user.
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

/// Wire-level response type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum ResponseType {
    AcknowledgePing,
    Message,
    Defer,
    ComponentDefer,
    EditOriginalMessage,
    AutocompleteResult,
    Modal,
}

impl From<ResponseType> for u8 {
    fn from(kind: ResponseType) -> u8 {
        match kind {
            ResponseType::AcknowledgePing => 1,
            ResponseType::Message => 4,
            ResponseType::Defer => 5,
            ResponseType::ComponentDefer => 6,
            ResponseType::EditOriginalMessage => 7,
            ResponseType::AutocompleteResult => 8,
            ResponseType::Modal => 9,
        }
    }
}

/// Content of a message, used both for new messages and edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub tts: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub flags: u64,
}

fn is_zero(flags: &u64) -> bool {
    *flags == 0
}

impl MessagePayload {
    /// A plain text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Only show the message to the invoking user.
    pub fn ephemeral(mut self) -> Self {
        self.flags |= EPHEMERAL_FLAG;
        self
    }

    pub fn embed(mut self, embed: serde_json::Value) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Append an action row (or any top-level component object).
    pub fn component(mut self, component: serde_json::Value) -> Self {
        self.components.push(component);
        self
    }

    pub fn is_ephemeral(&self) -> bool {
        self.flags & EPHEMERAL_FLAG != 0
    }
}

/// One suggestion returned to an autocomplete query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutocompleteChoice {
    pub name: String,
    pub value: serde_json::Value,
}

impl AutocompleteChoice {
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A popup form shown in reply to a command or component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalPayload {
    pub custom_id: String,
    pub title: String,
    pub components: Vec<serde_json::Value>,
}

/// A response to an interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Answer to a liveness ping.
    AcknowledgePing,
    /// Send a new message.
    Message(MessagePayload),
    /// Edit the message the interaction originated from (or, as a follow-up,
    /// the original deferred response).
    EditOriginalMessage(MessagePayload),
    /// Provisional acknowledgment; the real content follows later.
    Defer { ephemeral: bool },
    /// Provisional acknowledgment of a component interaction.
    ComponentDefer { ephemeral: bool },
    AutocompleteResult(Vec<AutocompleteChoice>),
    Modal(ModalPayload),
}

impl Response {
    /// Shorthand for a plain text message.
    pub fn message(content: impl Into<String>) -> Self {
        Self::Message(MessagePayload::text(content))
    }

    pub fn response_type(&self) -> ResponseType {
        match self {
            Self::AcknowledgePing => ResponseType::AcknowledgePing,
            Self::Message(_) => ResponseType::Message,
            Self::EditOriginalMessage(_) => ResponseType::EditOriginalMessage,
            Self::Defer { .. } => ResponseType::Defer,
            Self::ComponentDefer { .. } => ResponseType::ComponentDefer,
            Self::AutocompleteResult(_) => ResponseType::AutocompleteResult,
            Self::Modal(_) => ResponseType::Modal,
        }
    }

    /// Whether this is one of the two provisional acknowledgment kinds.
    pub fn is_defer(&self) -> bool {
        matches!(self, Self::Defer { .. } | Self::ComponentDefer { .. })
    }

    /// Message content usable as a follow-up body, if this kind allows it.
    pub fn followup_payload(&self) -> Option<&MessagePayload> {
        match self {
            Self::Message(payload) | Self::EditOriginalMessage(payload) => Some(payload),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct DeferData {
    flags: u64,
}

#[derive(Serialize)]
struct ChoicesData<'a> {
    choices: &'a [AutocompleteChoice],
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = u8::from(self.response_type());
        match self {
            Self::AcknowledgePing
            | Self::Defer { ephemeral: false }
            | Self::ComponentDefer { ephemeral: false } => {
                let mut s = serializer.serialize_struct("Response", 1)?;
                s.serialize_field("type", &kind)?;
                s.end()
            }
            Self::Defer { ephemeral: true } | Self::ComponentDefer { ephemeral: true } => {
                let mut s = serializer.serialize_struct("Response", 2)?;
                s.serialize_field("type", &kind)?;
                s.serialize_field("data", &DeferData { flags: EPHEMERAL_FLAG })?;
                s.end()
            }
            Self::Message(payload) | Self::EditOriginalMessage(payload) => {
                let mut s = serializer.serialize_struct("Response", 2)?;
                s.serialize_field("type", &kind)?;
                s.serialize_field("data", payload)?;
                s.end()
            }
            Self::AutocompleteResult(choices) => {
                let mut s = serializer.serialize_struct("Response", 2)?;
                s.serialize_field("type", &kind)?;
                s.serialize_field("data", &ChoicesData { choices })?;
                s.end()
            }
            Self::Modal(modal) => {
                let mut s = serializer.serialize_struct("Response", 2)?;
                s.serialize_field("type", &kind)?;
                s.serialize_field("data", modal)?;
                s.end()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ack_ping_wire_shape() {
        let value = serde_json::to_value(Response::AcknowledgePing).unwrap();
        assert_eq!(value, json!({"type": 1}));
    }

    #[test]
    fn test_message_wire_shape_omits_empty_fields() {
        let value = serde_json::to_value(Response::message("pong")).unwrap();
        assert_eq!(value, json!({"type": 4, "data": {"content": "pong"}}));
    }

    #[test]
    fn test_ephemeral_message_sets_flag() {
        let response = Response::Message(MessagePayload::text("secret").ephemeral());
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["data"]["flags"], json!(64));
    }

    #[test]
    fn test_defer_wire_shapes() {
        assert_eq!(
            serde_json::to_value(Response::Defer { ephemeral: false }).unwrap(),
            json!({"type": 5})
        );
        assert_eq!(
            serde_json::to_value(Response::ComponentDefer { ephemeral: true }).unwrap(),
            json!({"type": 6, "data": {"flags": 64}})
        );
    }

    #[test]
    fn test_autocomplete_wire_shape() {
        let response = Response::AutocompleteResult(vec![AutocompleteChoice::new("hello", "hello")]);
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(
            value,
            json!({"type": 8, "data": {"choices": [{"name": "hello", "value": "hello"}]}})
        );
    }

    #[test]
    fn test_followup_payload_only_for_messages() {
        assert!(Response::message("x").followup_payload().is_some());
        assert!(Response::EditOriginalMessage(MessagePayload::text("x"))
            .followup_payload()
            .is_some());
        assert!(Response::Defer { ephemeral: false }.followup_payload().is_none());
        assert!(Response::AcknowledgePing.followup_payload().is_none());
    }
}
