use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::MessagingProvider;

pub struct WhatsAppProvider {
    access_token: String,
    messages_url: String,
    client: reqwest::Client,
}

impl WhatsAppProvider {
    pub fn new(access_token: String, phone_number_id: &str, api_version: &str) -> Self {
        Self {
            access_token,
            messages_url: format!(
                "https://graph.facebook.com/{api_version}/{phone_number_id}/messages"
            ),
            client: reqwest::Client::new(),
        }
    }
}

fn text_payload(to: &str, body: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "text": { "body": body },
    })
}

#[async_trait]
impl MessagingProvider for WhatsAppProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!(to, "sending WhatsApp message");

        let resp = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.access_token)
            .json(&text_payload(to, body))
            .send()
            .await
            .context("failed to send WhatsApp message")?
            .error_for_status()
            .context("WhatsApp API returned error")?;

        tracing::debug!(status = %resp.status(), "WhatsApp message accepted");
        Ok(())
    }
}
