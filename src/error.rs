use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::io;

/// Startup and configuration errors for the listener process
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Terminal failures of a single webhook request.
///
/// Each variant maps to one status code and a fixed `detail` message; the
/// underlying cause of a tracker failure is logged, never sent back.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Invalid Webhook Payload structure.")]
    MalformedPayload,

    #[error("Jira API Fetch Error")]
    TrackerFetch,
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MalformedPayload => StatusCode::BAD_REQUEST,
            WebhookError::TrackerFetch => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(json!({
                "detail": self.to_string()
            })),
        )
            .into_response()
    }
}

/// Helper type for Results that use ListenerError
pub type Result<T> = std::result::Result<T, ListenerError>;

/// Failures from the outbound Jira lookup. Never shown to webhook callers.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Jira request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Jira returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Unexpected Jira response: {0}")]
    MalformedResponse(String),
}
