use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::ai::CompletionProvider;
use crate::services::booking::BookingBackend;
use crate::services::messaging::MessagingProvider;
use crate::services::tools::ToolRegistry;
use crate::services::transcripts::TranscriptStore;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub llm: Box<dyn CompletionProvider>,
    pub messaging: Box<dyn MessagingProvider>,
    pub bookings: Box<dyn BookingBackend>,
    pub tools: ToolRegistry,
    pub transcripts: Box<dyn TranscriptStore>,
}
