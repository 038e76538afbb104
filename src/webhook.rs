//! Webhook related structures
//!
//! Everything here is pure: the HTTP handler feeds in the decoded JSON body
//! and turns the resulting [`Outcome`] into a response.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::WebhookError;
use crate::tracker::TicketRecord;

/// Jira-style key: two or more uppercase letters, a hyphen, digits (`PROJ-123`).
static TICKET_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{2,}-[0-9]+").unwrap());

pub const SUCCESS_MESSAGE: &str = "Requirements gathered. Ready for AI generation.";

/// The subset of a GitHub `pull_request` event this service reads.
///
/// Every field must be present. A `null` scalar reads as its default, so
/// `merged: null` counts as not merged and a `null` title is searched as empty.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PullRequestEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    pub pull_request: PullRequest,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PullRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    pub head: GitRef,
    #[serde(deserialize_with = "null_as_default")]
    pub merged: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GitRef {
    #[serde(rename = "ref", deserialize_with = "null_as_default")]
    pub ref_name: String,
}

// Without `#[serde(default)]` a missing key still fails with "missing field".
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl PullRequestEvent {
    /// Only a PR that was closed without merging is filtered out. Other
    /// actions pass through whatever their `merged` flag says.
    pub fn closed_without_merge(&self) -> bool {
        self.action == "closed" && !self.pull_request.merged
    }

    /// Title and branch name joined by a single space.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.pull_request.title, self.pull_request.head.ref_name)
    }
}

/// Why a well-formed payload was not acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotPullRequest,
    ClosedWithoutMerge,
    NoTicketId,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::NotPullRequest => "Not a Pull Request event.",
            IgnoreReason::ClosedWithoutMerge => "PR was closed without merging.",
            IgnoreReason::NoTicketId => "No Jira ticket ID found.",
        }
    }
}

/// Result of evaluating a payload before any tracker call is made.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ignore(IgnoreReason),
    Trigger {
        ticket_id: String,
        event: PullRequestEvent,
    },
}

/// Returns the leftmost ticket key in `text`, if any. Matching is
/// case-sensitive, and the project prefix is not checked against the tracker.
pub fn extract_ticket_id(text: &str) -> Option<&str> {
    TICKET_ID_REGEX.find(text).map(|m| m.as_str())
}

/// Decide what to do with a decoded webhook body.
pub fn evaluate_payload(payload: &Value) -> Result<Outcome, WebhookError> {
    let object = payload.as_object().ok_or_else(|| {
        warn!("Webhook body is not a JSON object");
        WebhookError::MalformedPayload
    })?;

    if !object.contains_key("pull_request") {
        return Ok(Outcome::Ignore(IgnoreReason::NotPullRequest));
    }

    let event = PullRequestEvent::deserialize(payload).map_err(|e| {
        warn!("Pull request payload is missing required fields: {}", e);
        WebhookError::MalformedPayload
    })?;
    debug!("{:#?}", &event);

    if event.closed_without_merge() {
        return Ok(Outcome::Ignore(IgnoreReason::ClosedWithoutMerge));
    }

    let search_text = event.search_text();
    match extract_ticket_id(&search_text) {
        Some(ticket_id) => Ok(Outcome::Trigger {
            ticket_id: ticket_id.to_string(),
            event,
        }),
        None => {
            warn!("No Jira ticket found in PR title or branch: {:?}", search_text);
            Ok(Outcome::Ignore(IgnoreReason::NoTicketId))
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ignored,
    Success,
}

/// JSON body for every handled (HTTP 200) outcome.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WebhookResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl WebhookResponse {
    pub fn ignored(reason: IgnoreReason) -> Self {
        Self {
            status: ResponseStatus::Ignored,
            reason: Some(reason.as_str()),
            ticket: None,
            message: None,
        }
    }

    pub fn success(ticket: String) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: None,
            ticket: Some(ticket),
            message: Some(SUCCESS_MESSAGE),
        }
    }
}

/// Input for the test-generation step that follows a successful lookup.
/// Nothing consumes it yet; the handler assembles and logs it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerationRequest {
    pub ticket_id: String,
    pub branch: String,
    pub summary: String,
    pub description: Option<String>,
}

impl GenerationRequest {
    pub fn new(ticket_id: String, event: &PullRequestEvent, record: TicketRecord) -> Self {
        Self {
            ticket_id,
            branch: event.pull_request.head.ref_name.clone(),
            summary: record.summary,
            description: record.description,
        }
    }
}
