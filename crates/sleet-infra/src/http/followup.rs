//! HttpFollowupTransport -- concrete [`FollowupTransport`] over the webhook API.
//!
//! Edits the original (deferred) interaction response:
//! `PATCH {api_base}/webhooks/{application_id}/{token}/messages/@original`
//! with the message payload as the JSON body.
//!
//! The optional bot token is wrapped in [`secrecy::SecretString`] and is
//! only exposed when building the `Authorization` header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use sleet_core::notify::FollowupTransport;
use sleet_types::error::DeliveryError;
use sleet_types::response::MessagePayload;

/// Follow-up transport backed by `reqwest`.
pub struct HttpFollowupTransport {
    client: reqwest::Client,
    base_url: String,
    application_id: String,
    bot_token: Option<SecretString>,
}

impl HttpFollowupTransport {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(
        base_url: impl Into<String>,
        application_id: impl Into<String>,
        bot_token: Option<SecretString>,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("sleet/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeliveryError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            application_id: application_id.into(),
            bot_token,
        })
    }

    fn original_message_url(&self, token: &str) -> String {
        format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.base_url, self.application_id, token
        )
    }
}

impl FollowupTransport for HttpFollowupTransport {
    async fn edit_original(
        &self,
        token: &str,
        payload: &MessagePayload,
    ) -> Result<(), DeliveryError> {
        let url = self.original_message_url(token);

        let mut request = self.client.patch(&url).json(payload);
        if let Some(bot_token) = &self.bot_token {
            request = request.header(
                "authorization",
                format!("Bot {}", bot_token.expose_secret()),
            );
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(status = status.as_u16(), "original response edited");
        Ok(())
    }
}
