//! Service info endpoints

use axum::{Json, extract::State as AxumState};
use serde::Serialize;

use crate::SharedState;

pub async fn root() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " is listening for merged pull requests")
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub started_at: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct TrackerInfo {
    pub server: String,
    pub description_field: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub server: ServerInfo,
    pub tracker: TrackerInfo,
}

/// GET /status - Server uptime and the tracker it talks to
pub async fn status(AxumState(state): AxumState<SharedState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        server: ServerInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            started_at: state.started_at.to_rfc3339(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
        },
        tracker: TrackerInfo {
            server: state.tracker.base_url().to_string(),
            description_field: state.config.jira.description_field.clone(),
        },
    })
}
