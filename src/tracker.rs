//! Read-only Jira client used to look up the ticket named by a merged PR.

use serde_json::Value;
use tracing::{debug, info};

use crate::JiraConfig;
use crate::error::{ListenerError, TrackerError};

/// Longest error body kept from a failed Jira response.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Ticket fields needed downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketRecord {
    pub key: String,
    pub summary: String,
    pub description: Option<String>,
}

impl TicketRecord {
    /// Build a record from a Jira REST v2 issue document.
    pub fn from_issue(
        issue: &Value,
        requested_key: &str,
        description_field: &str,
    ) -> Result<Self, TrackerError> {
        let fields = issue
            .get("fields")
            .and_then(|f| f.as_object())
            .ok_or_else(|| TrackerError::MalformedResponse("missing 'fields' object".to_string()))?;

        let summary = fields
            .get("summary")
            .and_then(|s| s.as_str())
            .ok_or_else(|| TrackerError::MalformedResponse("missing 'summary' field".to_string()))?;

        let key = issue
            .get("key")
            .and_then(|k| k.as_str())
            .unwrap_or(requested_key);

        Ok(Self {
            key: key.to_string(),
            summary: summary.to_string(),
            description: render_field(fields.get(description_field)),
        })
    }
}

/// Plain strings pass through; custom fields holding structured values
/// (rich text documents, option lists) are kept as compact JSON.
fn render_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Jira REST client authenticated with an account email and API token.
/// Built once at startup and shared read-only between requests.
#[derive(Clone)]
pub struct JiraClient {
    http_client: reqwest::Client,
    base_url: String,
    email: String,
    api_token: String,
    description_field: String,
}

impl JiraClient {
    pub fn from_config(config: &JiraConfig) -> Result<Self, ListenerError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.server.trim_end_matches('/').to_string(),
            email: config.email.clone(),
            api_token: config.api_token.clone(),
            description_field: config.description_field.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one issue by key. Any transport, status or decoding problem is
    /// returned as a [`TrackerError`]; nothing is retried.
    pub async fn fetch_ticket(&self, ticket_id: &str) -> Result<TicketRecord, TrackerError> {
        let url = format!("{}/rest/api/2/issue/{}", self.base_url, ticket_id);
        let fields = format!("summary,{}", self.description_field);
        debug!("GET {} (fields={})", url, fields);

        let response = self
            .http_client
            .get(&url)
            .query(&[("fields", fields.as_str())])
            .basic_auth(&self.email, Some(&self.api_token))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY_LEN {
                let mut cut = MAX_ERROR_BODY_LEN;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
                body.push_str("... (truncated)");
            }
            return Err(TrackerError::Status { status, body });
        }

        let issue: Value = response
            .json()
            .await
            .map_err(|e| TrackerError::MalformedResponse(e.to_string()))?;

        let record = TicketRecord::from_issue(&issue, ticket_id, &self.description_field)?;
        info!("Fetched Jira ticket {}", record.key);
        Ok(record)
    }
}
