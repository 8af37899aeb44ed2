use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::plugins::traits::AlertSink;
use crate::utils::error::{AppError, Result};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts alerts as plain messages to a Discord webhook.
pub struct DiscordWebhookAlertSink {
    client: Client,
    webhook_url: String,
    username: Option<String>,
}

impl DiscordWebhookAlertSink {
    pub fn new(webhook_url: impl Into<String>, username: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
            username,
        })
    }

    fn create_webhook_payload(&self, message: &str) -> serde_json::Value {
        let mut payload = json!({ "content": message });

        if let Some(username) = &self.username {
            payload["username"] = json!(username);
        }

        payload
    }
}

#[async_trait]
impl AlertSink for DiscordWebhookAlertSink {
    async fn send(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&self.create_webhook_payload(message))
            .send()
            .await
            .map_err(|e| AppError::Alert(format!("discord webhook unreachable: {}", e)))?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Alert(format!(
                "discord webhook failed ({}): {}",
                status.as_u16(),
                body
            )));
        }

        tracing::debug!("Discord alert delivered");
        Ok(())
    }
}
