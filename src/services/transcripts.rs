use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::Transcript;

/// Exclusive access to one conversation's transcript for the length of a
/// turn. Dropping it lets the next turn for that conversation proceed.
pub type TranscriptGuard = OwnedMutexGuard<Transcript>;

#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Waits for any in-flight turn on `conversation_id`, creating the
    /// transcript with `system_prompt` on first contact.
    async fn checkout(&self, conversation_id: &str, system_prompt: &str) -> TranscriptGuard;

    fn conversation_count(&self) -> usize;
}

/// Process-local store; transcripts live until the process exits.
#[derive(Default)]
pub struct InMemoryTranscriptStore {
    transcripts: Mutex<HashMap<String, Arc<AsyncMutex<Transcript>>>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, conversation_id: &str, system_prompt: &str) -> Arc<AsyncMutex<Transcript>> {
        let mut transcripts = self
            .transcripts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let slot = transcripts
            .entry(conversation_id.to_string())
            .or_insert_with(|| {
                tracing::info!(conversation_id, "starting new transcript");
                Arc::new(AsyncMutex::new(Transcript::new(system_prompt)))
            });
        Arc::clone(slot)
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn checkout(&self, conversation_id: &str, system_prompt: &str) -> TranscriptGuard {
        let slot = self.slot(conversation_id, system_prompt);
        slot.lock_owned().await
    }

    fn conversation_count(&self) -> usize {
        self.transcripts
            .lock()
            .map(|t| t.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}
