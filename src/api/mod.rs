//! HTTP surface of the listener
//!
//! One webhook endpoint plus two read-only status endpoints.

pub mod status;
pub mod webhook;

use axum::{Router, routing};

use crate::SharedState;

pub use status::{root, status};
pub use webhook::handle_pr_merged;

pub const WEBHOOK_PATH: &str = "/webhook/pr-merged";

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::get(root))
        .route("/status", routing::get(status))
        .route(WEBHOOK_PATH, routing::post(handle_pr_merged))
        .with_state(state)
}
