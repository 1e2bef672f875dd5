use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("completion call failed: {0}")]
    Completion(String),

    #[error("completion call timed out after {secs}s")]
    CompletionTimeout { secs: u64 },

    #[error("webhook verification failed")]
    VerificationFailed,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Completion(_) => StatusCode::BAD_GATEWAY,
            AppError::CompletionTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::VerificationFailed => StatusCode::FORBIDDEN,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Model misuse of the tool surface. Recovered into a `tool` message, never
/// propagated out of a turn.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        source: serde_json::Error,
    },
}
