//! Interaction webhook handler.
//!
//! Extracts the signature headers and the raw body, hands them to the
//! `DispatchEngine`, and maps the outcome onto the HTTP reply. The body is
//! taken as raw bytes: the signature covers the exact bytes received.
//!
//! A pending follow-up is released only once the primary reply has been
//! built, so it never races ahead of the defer it edits.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;

use sleet_core::dispatch::{DispatchOutcome, InboundRequest};
use sleet_types::response::Response;

use crate::http::error::AppError;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// POST / - Receive a signed interaction.
pub async fn receive_interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Response>, AppError> {
    let request = InboundRequest {
        timestamp: header(&headers, TIMESTAMP_HEADER),
        signature: header(&headers, SIGNATURE_HEADER),
        body: &body,
    };

    match state.engine.handle(request).await {
        DispatchOutcome::Responded { response, followup } => {
            let reply = Json(response);
            if let Some(followup) = followup {
                followup.release();
            }
            Ok(reply)
        }
        DispatchOutcome::Unauthorized => Err(AppError::Unauthorized),
        DispatchOutcome::Malformed(reason) => Err(AppError::Malformed(reason)),
        DispatchOutcome::NotFound => Err(AppError::NotFound),
        DispatchOutcome::Failed(e) => Err(AppError::Internal(e.to_string())),
    }
}
