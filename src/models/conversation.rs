use super::message::ChatMessage;

/// Identity of the caller for one turn. Never shown to the model; the
/// orchestrator injects it into tools that act on the caller's behalf.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationContext {
    pub conversation_id: String,
}

impl ConversationContext {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
        }
    }
}

/// Ordered message history of one conversation. Always starts with the
/// system persona and only ever grows.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new(system_prompt: &str) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
