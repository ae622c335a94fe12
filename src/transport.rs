use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::AppError;

/// One inbound event from the messaging bridge. `sender` is the phone
/// identity in digits-only form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender: String,
    pub text: String,
    #[serde(default)]
    pub from_self: bool,
}

/// Outbound side of the messaging collaborator. A returned error means the
/// message was not locally accepted; there is no delivery confirmation
/// beyond that.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), AppError>;
}

/// Forwards outbound messages to an external bridge over HTTP.
pub struct WebhookSender {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookSender {
    pub fn new(endpoint: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| AppError::Internal(format!("failed to build http client: {err}")))?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl MessageSender for WebhookSender {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "recipient": recipient, "text": text }))
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("webhook send failed: {err}")))?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "webhook answered {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Stand-in sender used when no bridge is configured: logs every outbound
/// message and always accepts.
pub struct TraceSender;

#[async_trait]
impl MessageSender for TraceSender {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), AppError> {
        info!(recipient = %recipient, text = %text, "outbound message");
        Ok(())
    }
}
