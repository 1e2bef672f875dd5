use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use glossy::config::AppConfig;
use glossy::db;
use glossy::handlers;
use glossy::services::ai::openai::OpenAiProvider;
use glossy::services::booking::SqliteBookingBackend;
use glossy::services::messaging::whatsapp::WhatsAppProvider;
use glossy::services::tools::ToolRegistry;
use glossy::services::transcripts::InMemoryTranscriptStore;
use glossy::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(!config.openai_api_key.is_empty(), "OPENAI_API_KEY must be set");
    if config.verify_token.is_empty() {
        tracing::warn!("META_VERIFY_TOKEN not set, webhook verification will always fail");
    }

    let db = Arc::new(Mutex::new(db::init_db(&config.database_url)?));

    tracing::info!(
        "using completion model {} at {}",
        config.openai_model,
        config.openai_base_url
    );
    let llm = OpenAiProvider::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
    );
    let messaging = WhatsAppProvider::new(
        config.meta_access_token.clone(),
        &config.phone_number_id,
        &config.whatsapp_api_version,
    );
    let bookings = SqliteBookingBackend::new(Arc::clone(&db), config.booking_date);

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        llm: Box::new(llm),
        messaging: Box::new(messaging),
        bookings: Box::new(bookings),
        tools: ToolRegistry::new(),
        transcripts: Box::new(InMemoryTranscriptStore::new()),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
