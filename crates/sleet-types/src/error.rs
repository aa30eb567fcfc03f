use thiserror::Error;

use crate::response::ResponseType;

/// Errors raised while authenticating an inbound request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid signature")]
    BadSignature,
}

/// A handler was registered under a key that is already taken.
///
/// This is a startup-time configuration error: the process must not begin
/// serving with an ambiguous registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{registry} handler already registered for key '{key}'")]
pub struct DuplicateKeyError {
    /// Which of the four mappings rejected the registration.
    pub registry: &'static str,
    /// Human-readable rendering of the rejected key.
    pub key: String,
}

/// Errors delivering a deferred result through the follow-up webhook.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The background task produced a response that cannot be sent as a
    /// follow-up (only messages and message edits can).
    #[error("response type {0:?} cannot be delivered as a follow-up")]
    InvalidFollowupKind(ResponseType),

    #[error("follow-up rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("follow-up transport error: {0}")]
    Transport(String),
}

/// Errors turning an inbound JSON document into an `Interaction`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InteractionParseError {
    #[error("unknown {kind} code {code}")]
    UnknownCode { kind: &'static str, code: u8 },

    #[error("interaction of type {0} is missing its data payload")]
    MissingData(&'static str),

    #[error("invalid {kind} payload: {message}")]
    InvalidData { kind: &'static str, message: String },
}

/// Errors loading or validating the server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config file: {0}")]
    Parse(String),

    #[error("missing required setting '{0}'")]
    Missing(&'static str),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}
