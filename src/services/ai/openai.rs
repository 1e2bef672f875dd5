use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{CompletionProvider, ToolChoice};
use crate::models::{ChatMessage, Completion, ToolCallRequest};
use crate::services::tools::ToolDefinition;

/// Chat completions client for OpenAI and API-compatible providers.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }

    fn request_body(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });

        if !tools.is_empty() {
            let tools: Vec<Value> = tools.iter().map(ToolDefinition::to_json).collect();
            body["tools"] = Value::Array(tools);
            body["tool_choice"] = json!(tool_choice.as_str());
        }

        body
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallRequest>>,
}

fn parse_completion(data: Value) -> anyhow::Result<Completion> {
    let response: CompletionResponse =
        serde_json::from_value(data).context("unexpected completion response shape")?;

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| anyhow::anyhow!("completion response has no choices"))?;

    Ok(Completion {
        content: message.content,
        tool_calls: message.tool_calls.unwrap_or_default(),
    })
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> anyhow::Result<Completion> {
        let body = self.request_body(messages, tools, tool_choice);

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call completion API")?;

        let status = resp.status();
        let data: Value = resp
            .json()
            .await
            .context("failed to parse completion response")?;

        if !status.is_success() {
            anyhow::bail!("completion API error ({}): {}", status, data);
        }

        parse_completion(data)
    }
}
