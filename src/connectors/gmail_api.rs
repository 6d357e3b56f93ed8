use std::fmt::Display;

use async_trait::async_trait;
use chrono::{Local, TimeZone};
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::connectors::{FetchError, MailGateway};
use crate::models::{MessageRecord, NO_SUBJECT, UNKNOWN_SENDER};
use crate::summary::format_display_time;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
pub const DEFAULT_FETCH_CONCURRENCY: usize = 10;
const REDACTED_BODY_MAX_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct GmailApiClient {
    client: Client,
    base_url: String,
    concurrency: usize,
}

impl GmailApiClient {
    /// `client` carries the per-request timeout; `base_url` is normally
    /// [`GMAIL_API_BASE`].
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn fetch_json<T: DeserializeOwned>(&self, token: &str, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                body = %redact_response_body(&body),
                "gmail api request failed"
            );
            let message = provider_error_message(&body).unwrap_or_else(|| {
                format!(
                    "gmail api request failed: status={} body={}",
                    status,
                    redact_response_body(&body)
                )
            });
            return Err(FetchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn list_message_ids(
        &self,
        token: &str,
        max_results: usize,
    ) -> Result<Vec<String>, FetchError> {
        let url = format!("{}/users/me/messages?maxResults={max_results}", self.base_url);
        let list: GmailMessageList = self.fetch_json(token, &url).await?;
        let stubs = list.messages.unwrap_or_default();
        debug!(
            ids = stubs.len(),
            estimate = list.result_size_estimate.unwrap_or_default(),
            "gmail message list received"
        );

        stubs
            .into_iter()
            .map(|stub| {
                stub.id
                    .filter(|id| !id.is_empty())
                    .ok_or(FetchError::MissingMessageId)
            })
            .collect()
    }

    async fn get_message(&self, token: &str, message_id: &str) -> Result<GmailMessage, FetchError> {
        let url = format!(
            "{}/users/me/messages/{message_id}?format=metadata&metadataHeaders=From&metadataHeaders=Subject",
            self.base_url
        );
        self.fetch_json(token, &url).await
    }
}

#[async_trait]
impl MailGateway for GmailApiClient {
    fn name(&self) -> &str {
        "gmail_api"
    }

    async fn list_recent_messages(
        &self,
        access_token: &str,
        max_results: usize,
    ) -> Result<Vec<MessageRecord>, FetchError> {
        let ids = self.list_message_ids(access_token, max_results).await?;

        // buffered keeps list order; try_collect drops in-flight requests on the first error
        let records: Vec<MessageRecord> = stream::iter(ids)
            .map(|id| async move {
                let message = self.get_message(access_token, &id).await?;
                Ok::<_, FetchError>(map_gmail_message_to_record(&message, &Local))
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        info!(count = records.len(), "fetched gmail messages");
        Ok(records)
    }
}

pub(crate) fn map_gmail_message_to_record<Tz>(message: &GmailMessage, tz: &Tz) -> MessageRecord
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let sender = extract_header(message, "From").unwrap_or_else(|| UNKNOWN_SENDER.to_string());
    let subject = extract_header(message, "Subject").unwrap_or_else(|| NO_SUBJECT.to_string());

    let internal_millis = message
        .internal_date
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(0);

    MessageRecord {
        id: message.id.clone().unwrap_or_default(),
        snippet: message.snippet.clone().unwrap_or_default(),
        sender,
        subject,
        time: format_display_time(internal_millis, tz),
    }
}

/// Exact, case-sensitive header lookup. Empty values count as absent.
fn extract_header(message: &GmailMessage, name: &str) -> Option<String> {
    message
        .payload
        .as_ref()
        .and_then(|payload| payload.headers.as_deref())
        .unwrap_or_default()
        .iter()
        .find(|header| header.name == name)
        .and_then(|header| header.value.clone())
        .filter(|value| !value.is_empty())
}

/// Pull `error.message` out of a Google JSON error body.
fn provider_error_message(body: &str) -> Option<String> {
    let payload: GoogleErrorBody = serde_json::from_str(body).ok()?;
    match payload.error {
        GoogleErrorDetail::Structured { message } => message,
        GoogleErrorDetail::Plain(message) => Some(message),
    }
    .filter(|message| !message.trim().is_empty())
}

pub(crate) fn redact_response_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= REDACTED_BODY_MAX_LEN {
        trimmed.to_string()
    } else {
        let mut cut = REDACTED_BODY_MAX_LEN;
        while !trimmed.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…[truncated {} bytes]", &trimmed[..cut], trimmed.len())
    }
}

// --- Gmail API response types ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessageList {
    messages: Option<Vec<GmailMessageStub>>,
    result_size_estimate: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct GmailMessageStub {
    id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GmailMessage {
    pub id: Option<String>,
    pub snippet: Option<String>,
    pub payload: Option<GmailPayload>,
    pub internal_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GmailPayload {
    pub headers: Option<Vec<GmailHeader>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GmailHeader {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GoogleErrorDetail {
    Structured { message: Option<String> },
    Plain(String),
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::{
        map_gmail_message_to_record, provider_error_message, redact_response_body, GmailMessage,
    };
    use crate::models::{NO_SUBJECT, UNKNOWN_SENDER};

    fn message(value: serde_json::Value) -> GmailMessage {
        serde_json::from_value(value).expect("decode gmail message")
    }

    #[test]
    fn gmail_message_maps_to_record() {
        let millis = Utc
            .with_ymd_and_hms(2026, 10, 14, 8, 30, 0)
            .unwrap()
            .timestamp_millis();
        let msg = message(json!({
            "id": "18c1",
            "threadId": "t-1",
            "snippet": "Lunch at noon? It&#39;s on me",
            "internalDate": millis.to_string(),
            "payload": {
                "headers": [
                    {"name": "From", "value": "Bob <bob@x.com>"},
                    {"name": "Subject", "value": "Lunch"}
                ]
            }
        }));

        let record = map_gmail_message_to_record(&msg, &Utc);
        assert_eq!(record.id, "18c1");
        assert_eq!(record.sender, "Bob <bob@x.com>");
        assert_eq!(record.subject, "Lunch");
        assert_eq!(record.snippet, "Lunch at noon? It&#39;s on me");
        assert_eq!(record.time, "10/14/2026, 8:30:00 AM");
    }

    #[test]
    fn missing_headers_use_defaults() {
        let msg = message(json!({
            "id": "18c2",
            "payload": {"headers": [{"name": "Subject", "value": ""}]}
        }));
        let record = map_gmail_message_to_record(&msg, &Utc);
        assert_eq!(record.sender, UNKNOWN_SENDER);
        assert_eq!(record.subject, NO_SUBJECT);
        assert_eq!(record.snippet, "");
        assert_eq!(record.time, "1/1/1970, 12:00:00 AM");
    }

    #[test]
    fn header_names_match_case_sensitively() {
        let msg = message(json!({
            "id": "18c3",
            "payload": {"headers": [
                {"name": "from", "value": "lower@x.com"},
                {"name": "SUBJECT", "value": "Shouting"}
            ]}
        }));
        let record = map_gmail_message_to_record(&msg, &Utc);
        assert_eq!(record.sender, UNKNOWN_SENDER);
        assert_eq!(record.subject, NO_SUBJECT);
    }

    #[test]
    fn message_without_payload_or_id_still_maps() {
        let record = map_gmail_message_to_record(&message(json!({})), &Utc);
        assert_eq!(record.id, "");
        assert_eq!(record.sender, UNKNOWN_SENDER);
    }

    #[test]
    fn provider_error_message_extracts_google_error() {
        let body = r#"{"error":{"code":401,"message":"Request had invalid authentication credentials.","status":"UNAUTHENTICATED"}}"#;
        assert_eq!(
            provider_error_message(body).as_deref(),
            Some("Request had invalid authentication credentials.")
        );
        assert_eq!(
            provider_error_message(r#"{"error":"invalid_grant"}"#).as_deref(),
            Some("invalid_grant")
        );
        assert!(provider_error_message("<html>bad gateway</html>").is_none());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let redacted = redact_response_body(&body);
        assert!(redacted.starts_with(&"x".repeat(200)));
        assert!(redacted.ends_with("[truncated 500 bytes]"));
        assert_eq!(redact_response_body("  short  "), "short");
    }
}
