// Discord webhook chat channel - posts embeds and edits them in place
use crate::application::chat_channel::{ChatChannel, MessageHandle};
use crate::domain::payload::DisplayPayload;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

/// Discord rejects empty field values.
const EMPTY_FIELD: &str = "\u{200b}";

#[derive(Debug, Clone)]
pub struct DiscordWebhook {
    client: reqwest::Client,
    webhook_url: String,
}

#[derive(Debug, Deserialize)]
struct WebhookMessage {
    id: String,
}

impl DiscordWebhook {
    pub fn new(client: reqwest::Client, webhook_url: &str) -> Self {
        Self {
            client,
            webhook_url: webhook_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Webhook body carrying `payload` as a single embed.
pub fn render_embed(payload: &DisplayPayload) -> Value {
    let fields: Vec<Value> = payload
        .fields
        .iter()
        .map(|f| {
            let value = if f.value.is_empty() {
                EMPTY_FIELD
            } else {
                f.value.as_str()
            };
            json!({ "name": f.name, "value": value, "inline": f.inline })
        })
        .collect();

    let mut embed = json!({
        "title": payload.title,
        "description": payload.description,
        "fields": fields,
    });
    if let Some(color) = payload.color.rgb() {
        embed["color"] = json!(color);
    }
    if let Some(url) = &payload.image_url {
        embed["image"] = json!({ "url": url });
    }
    if let Some(footer) = &payload.footer {
        embed["footer"] = json!({ "text": footer });
    }
    if let Some(timestamp) = payload.timestamp {
        embed["timestamp"] = json!(timestamp.to_rfc3339());
    }

    json!({ "embeds": [embed] })
}

#[async_trait]
impl ChatChannel for DiscordWebhook {
    async fn post(&self, payload: &DisplayPayload) -> Result<MessageHandle> {
        let message: WebhookMessage = self
            .client
            .post(&self.webhook_url)
            .query(&[("wait", "true")])
            .json(&render_embed(payload))
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to send webhook message")?
            .error_for_status()
            .map_err(reqwest::Error::without_url)
            .context("Discord rejected webhook message")?
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to parse webhook response")?;

        Ok(MessageHandle { id: message.id })
    }

    async fn edit(&self, handle: &MessageHandle, payload: &DisplayPayload) -> Result<()> {
        self.client
            .patch(format!("{}/messages/{}", self.webhook_url, handle.id))
            .json(&render_embed(payload))
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to send webhook edit")?
            .error_for_status()
            .map_err(reqwest::Error::without_url)
            .context("Discord rejected webhook edit")?;

        Ok(())
    }
}
