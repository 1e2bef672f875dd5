use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::services::conversation;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct InboundMessage {
    pub from: String,
    pub text: String,
}

// GET /webhook (Meta subscription handshake)
pub async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Result<String, AppError> {
    let expected = state.config.verify_token.as_str();

    match (query.mode.as_deref(), query.verify_token.as_deref(), query.challenge) {
        (Some("subscribe"), Some(token), Some(challenge))
            if !expected.is_empty() && token == expected =>
        {
            tracing::info!("webhook verified");
            Ok(challenge)
        }
        _ => {
            tracing::warn!("webhook verification failed");
            Err(AppError::VerificationFailed)
        }
    }
}

// POST /webhook
pub async fn receive_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    tracing::debug!(payload = %body, "received webhook");

    let Some(inbound) = extract_text_message(&body) else {
        tracing::info!("non-message webhook or malformed payload, ignoring");
        return Json(json!({ "status": "ok" }));
    };

    tracing::info!(from = %inbound.from, body = %inbound.text, "incoming WhatsApp message");

    match conversation::process_message(&state, &inbound.from, &inbound.text).await {
        Ok(Some(reply)) => {
            tracing::info!(to = %inbound.from, reply = %reply, "assistant reply");
            if let Err(e) = state.messaging.send_message(&inbound.from, &reply).await {
                tracing::error!(error = %e, "failed to send reply");
            }
        }
        Ok(None) => {
            tracing::info!(from = %inbound.from, "no reply produced, nothing sent");
        }
        Err(e) => {
            tracing::error!(error = %e, from = %inbound.from, "conversation processing failed");
        }
    }

    Json(json!({ "status": "ok" }))
}

/// Pulls the first text message out of a WhatsApp Cloud API notification.
/// Status updates and other events yield `None`.
pub fn extract_text_message(body: &Value) -> Option<InboundMessage> {
    let message = body.pointer("/entry/0/changes/0/value/messages/0")?;
    let from = message.get("from")?.as_str()?.trim();
    let text = message.pointer("/text/body")?.as_str()?;

    if from.is_empty() || text.trim().is_empty() {
        return None;
    }

    Some(InboundMessage {
        from: from.to_string(),
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_message() {
        let body = json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "WABA_ID",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "messages": [{
                            "from": "15551234567",
                            "id": "wamid.123",
                            "type": "text",
                            "text": { "body": " Book a Men's Haircut " }
                        }]
                    }
                }]
            }]
        });
        assert_eq!(
            extract_text_message(&body),
            Some(InboundMessage {
                from: "15551234567".to_string(),
                text: " Book a Men's Haircut ".to_string(),
            })
        );
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let body = json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "messages": [{ "from": "15551234567", "type": "text", "text": { "body": " \n\t " } }]
                    }
                }]
            }]
        });
        assert_eq!(extract_text_message(&body), None);
    }

    #[test]
    fn test_status_update_is_ignored() {
        let body = json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "statuses": [{ "id": "wamid.123", "status": "delivered" }]
                    }
                }]
            }]
        });
        assert_eq!(extract_text_message(&body), None);
    }

    #[test]
    fn test_non_text_message_is_ignored() {
        let body = json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "messages": [{ "from": "15551234567", "type": "image", "image": {} }]
                    }
                }]
            }]
        });
        assert_eq!(extract_text_message(&body), None);
        assert_eq!(extract_text_message(&json!({})), None);
    }
}
