pub mod openai;

use async_trait::async_trait;

use crate::models::{ChatMessage, Completion};
use crate::services::tools::ToolDefinition;

/// How freely the model may call the offered tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    Auto,
    None,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// One chat completion over `messages`. An empty `tools` slice means no
    /// tools are offered at all.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> anyhow::Result<Completion>;
}
