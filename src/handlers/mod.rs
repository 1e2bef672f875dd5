pub mod health;
pub mod webhook;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/webhook",
            get(webhook::verify_webhook).post(webhook::receive_message),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
