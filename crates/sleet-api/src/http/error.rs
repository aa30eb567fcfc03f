//! Application error type mapping dispatch failures to HTTP replies.
//!
//! Every error body has the fixed shape `{"error": "<message>"}`; internal
//! details are logged by the engine, never returned to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Signature missing or invalid.
    Unauthorized,
    /// Verified body that is not a valid interaction.
    Malformed(String),
    /// No handler registered for the interaction.
    NotFound,
    /// Handler failure or a second primary response.
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::Malformed(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "invalid signature",
            AppError::Malformed(_) => "malformed interaction",
            AppError::NotFound => "command not found",
            AppError::Internal(_) => "internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Malformed(detail) | AppError::Internal(detail) = &self {
            tracing::debug!(status = self.status().as_u16(), %detail, "error reply");
        }
        let body = json!({ "error": self.message() });

        (
            self.status(),
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
