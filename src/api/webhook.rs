//! Webhook handler for GitHub pull request events

use axum::{Json, body::Bytes, extract::State as AxumState};
use serde_json::Value;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::error::WebhookError;
use crate::webhook::{GenerationRequest, Outcome, WebhookResponse, evaluate_payload};
use crate::{AppState, SharedState};

/// POST /webhook/pr-merged
///
/// Replies 200 for every handled outcome, including ignored events. Only a
/// malformed payload (400) or a failed Jira lookup (500) produce errors.
pub async fn handle_pr_merged(
    AxumState(state): AxumState<SharedState>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookError> {
    let request_id = Uuid::now_v7();
    let span = info_span!("webhook", %request_id);

    process_webhook(&state, &body)
        .instrument(span)
        .await
        .map(Json)
}

async fn process_webhook(
    state: &AppState,
    body: &[u8],
) -> Result<WebhookResponse, WebhookError> {
    let payload: Value = serde_json::from_slice(body).map_err(|e| {
        warn!("Could not parse JSON body: {}", e);
        WebhookError::MalformedPayload
    })?;

    let (ticket_id, event) = match evaluate_payload(&payload)? {
        Outcome::Ignore(reason) => {
            info!("Ignoring webhook: {}", reason.as_str());
            return Ok(WebhookResponse::ignored(reason));
        }
        Outcome::Trigger { ticket_id, event } => (ticket_id, event),
    };

    info!("[TRIGGER] PR merged! Found Jira ticket: {}", ticket_id);

    let record = state.tracker.fetch_ticket(&ticket_id).await.map_err(|e| {
        error!("Failed to fetch Jira ticket {}: {}", ticket_id, e);
        WebhookError::TrackerFetch
    })?;

    info!("Ticket summary: {}", record.summary);
    debug!(
        "Description/requirements:\n{}",
        record.description.as_deref().unwrap_or("(none)")
    );

    let request = GenerationRequest::new(ticket_id.clone(), &event, record);
    info!(
        ticket = %request.ticket_id,
        branch = %request.branch,
        "Requirements ready for test generation"
    );

    Ok(WebhookResponse::success(ticket_id))
}
