//! Follow-up delivery.
//!
//! `FollowupTransport` is the port the HTTP client implements; it edits the
//! original (deferred) response addressed by the interaction token.
//! `WebhookNotifier` decides whether and what to deliver:
//! - `None` results send nothing
//! - message and edit-original responses are delivered
//! - anything else is rejected with `DeliveryError::InvalidFollowupKind`
//!
//! Follows the RPITIT + object-safe `...Dyn` blanket-impl pattern so a
//! transport can be chosen at runtime.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use sleet_types::error::DeliveryError;
use sleet_types::interaction::Interaction;
use sleet_types::response::{MessagePayload, Response};

/// Sends follow-up content for a deferred interaction.
pub trait FollowupTransport: Send + Sync {
    /// Replace the original deferred response with `payload`.
    fn edit_original(
        &self,
        token: &str,
        payload: &MessagePayload,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Object-safe version of [`FollowupTransport`] with boxed futures.
pub trait FollowupTransportDyn: Send + Sync {
    fn edit_original_boxed<'a>(
        &'a self,
        token: &'a str,
        payload: &'a MessagePayload,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>;
}

impl<T: FollowupTransport> FollowupTransportDyn for T {
    fn edit_original_boxed<'a>(
        &'a self,
        token: &'a str,
        payload: &'a MessagePayload,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>> {
        Box::pin(self.edit_original(token, payload))
    }
}

/// Delivers deferred results through the platform's follow-up webhook.
#[derive(Clone)]
pub struct WebhookNotifier {
    transport: Arc<dyn FollowupTransportDyn>,
}

impl WebhookNotifier {
    pub fn new<T: FollowupTransport + 'static>(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Deliver a deferred result for `interaction`.
    pub async fn notify(
        &self,
        interaction: &Interaction,
        result: Option<Response>,
    ) -> Result<(), DeliveryError> {
        let Some(response) = result else {
            tracing::debug!("deferred work produced no follow-up");
            return Ok(());
        };

        let payload = response
            .followup_payload()
            .ok_or(DeliveryError::InvalidFollowupKind(response.response_type()))?;

        self.transport
            .edit_original_boxed(&interaction.token, payload)
            .await?;

        tracing::debug!(
            response_type = ?response.response_type(),
            "follow-up delivered"
        );
        Ok(())
    }
}
